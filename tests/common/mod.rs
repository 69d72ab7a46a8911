//! Shared utilities for integration testing.
//!
//! Builds a throwaway root directory laid out like a real deployment:
//! `config/orientdb-server-config.xml` as the template and
//! `orientdb/bin/server.sh` as a fake server script.

#![allow(dead_code)]

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

use orientdb_supervisor::SupervisorConfig;

pub const TEMPLATE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<orient-server>
    <network>
        <protocols>
            <protocol name="binary" implementation="com.orientechnologies.orient.server.network.protocol.binary.ONetworkProtocolBinary"/>
        </protocols>
    </network>
    <users>
        <user name="root" password="template" resources="*"/>
    </users>
    <properties>
        <entry name="log.console.level" value="info"/>
        <entry name="server.database.path" value="./databases"/>
    </properties>
</orient-server>
"#;

/// Script that announces readiness on stderr, then idles until hung up.
pub const READY_SCRIPT: &str = r#"#!/bin/sh
echo "$$" >> "$(dirname "$0")/spawns"
echo "booting"
echo "INFO OrientDB Server is active v2.1" >&2
exec sleep 30
"#;

/// Script that starts but never reports ready.
pub const SILENT_SCRIPT: &str = r#"#!/bin/sh
echo "$$" >> "$(dirname "$0")/spawns"
echo "still warming up" >&2
exec sleep 30
"#;

/// Script that dies right away.
pub const CRASHING_SCRIPT: &str = r#"#!/bin/sh
echo "$$" >> "$(dirname "$0")/spawns"
echo "fatal: no java" >&2
exit 3
"#;

/// Script that ignores SIGHUP, so a polite stop never ends it.
pub const STUBBORN_SCRIPT: &str = r#"#!/bin/sh
trap '' HUP
echo "$$" >> "$(dirname "$0")/spawns"
echo "OrientDB Server is active" >&2
exec sleep 30
"#;

pub struct TestRoot {
    pub dir: TempDir,
}

impl TestRoot {
    /// Root with the template and the given server script.
    pub fn new(script: &str) -> Self {
        let root = Self::bare();
        root.write_template(TEMPLATE);
        root.write_script(script);
        root
    }

    /// Empty root, nothing on disk.
    pub fn bare() -> Self {
        Self {
            dir: tempfile::tempdir().unwrap(),
        }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn template_path(&self) -> PathBuf {
        self.path().join("config").join("orientdb-server-config.xml")
    }

    pub fn output_path(&self) -> PathBuf {
        self.path()
            .join("orientdb")
            .join("config")
            .join("orientdb-server-config.xml")
    }

    pub fn write_template(&self, xml: &str) {
        let path = self.template_path();
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, xml).unwrap();
    }

    pub fn write_script(&self, body: &str) {
        let bin = self.path().join("orientdb").join("bin");
        fs::create_dir_all(&bin).unwrap();
        let script = bin.join("server.sh");
        fs::write(&script, body).unwrap();
        fs::set_permissions(&script, fs::Permissions::from_mode(0o755)).unwrap();
    }

    /// Replace the template with a FIFO, so reading it blocks until
    /// [`release_fifo_template`](Self::release_fifo_template).
    pub fn make_fifo_template(&self) {
        use nix::sys::stat::Mode;

        let path = self.template_path();
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        let _ = fs::remove_file(&path);
        nix::unistd::mkfifo(&path, Mode::S_IRWXU).unwrap();
    }

    /// Feed the template to a reader stuck on the FIFO, then put a regular
    /// template file back in its place.
    pub fn release_fifo_template(&self) {
        let path = self.template_path();
        fs::write(&path, TEMPLATE).unwrap();
        fs::remove_file(&path).unwrap();
        self.write_template(TEMPLATE);
    }

    /// How many times the fake script has been launched.
    pub fn spawn_count(&self) -> usize {
        let spawns = self.path().join("orientdb").join("bin").join("spawns");
        fs::read_to_string(spawns)
            .map(|s| s.lines().count())
            .unwrap_or(0)
    }

    /// Config rooted here with short timeouts.
    pub fn config(&self) -> SupervisorConfig {
        let mut config = SupervisorConfig::with_root(self.path());
        config.start_timeout_ms = 3000;
        config.stop_grace_ms = 500;
        config
    }
}
