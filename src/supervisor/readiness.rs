//! Readiness detection over the child's stderr lines.

/// Marker OrientDB prints to stderr once it accepts connections.
pub const DEFAULT_READY_MARKER: &str = "OrientDB Server is active";

/// Decides, line by line, whether the child has finished initializing.
pub trait ReadinessProbe: Send + Sync {
    fn is_ready(&self, line: &str) -> bool;
}

impl<F> ReadinessProbe for F
where
    F: Fn(&str) -> bool + Send + Sync,
{
    fn is_ready(&self, line: &str) -> bool {
        self(line)
    }
}

/// Case-insensitive substring match.
#[derive(Debug, Clone)]
pub struct MarkerProbe {
    marker: String,
}

impl MarkerProbe {
    pub fn new(marker: &str) -> Self {
        Self {
            marker: marker.to_lowercase(),
        }
    }
}

impl Default for MarkerProbe {
    fn default() -> Self {
        Self::new(DEFAULT_READY_MARKER)
    }
}

impl ReadinessProbe for MarkerProbe {
    fn is_ready(&self, line: &str) -> bool {
        line.to_lowercase().contains(&self.marker)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_marker_ignores_case() {
        let probe = MarkerProbe::default();
        assert!(probe.is_ready(
            "2024-01-01 12:00:00:000 INFO  OrientDB Server is active v3.2.30. [OServer]"
        ));
        assert!(probe.is_ready("orientdb server IS ACTIVE"));
        assert!(!probe.is_ready("OrientDB Server v3.2.30 is starting up..."));
    }

    #[test]
    fn test_closure_probe() {
        let probe = |line: &str| line.starts_with("READY");
        assert!(probe.is_ready("READY 1"));
        assert!(!probe.is_ready("not READY"));
    }
}
