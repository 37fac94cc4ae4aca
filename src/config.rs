//! CLI arguments and server configuration defaults.

use clap::Parser;
use shadow_rs::formatcp;
use std::path::{Path, PathBuf};

use crate::build;

const VERSION_INFO: &str = formatcp!(
    r#"{}\ncommit_hash: {}\nbuild_time: {}\nbuild_env: {},{}"#,
    build::PKG_VERSION,
    build::SHORT_COMMIT,
    build::BUILD_TIME,
    build::RUST_VERSION,
    build::RUST_CHANNEL
);

/// 默认端口；以该端口启动时列表只显示本进程上传的文件。
pub const DEFAULT_PORT: u16 = 13377;
pub const MAX_FORM_UPLOAD_SIZE: usize = 50 * 1024 * 1024;
pub const AUTH_REALM: &str = r#"Basic realm="Kutta File Server""#;
pub const CLIPBOARD_EXPORT_NAME: &str = "clipboard.json";
pub const SHUTDOWN_GRACE_SECS: u64 = 10;

/// CLI arguments and environment configuration for the server.
#[derive(Parser, Debug)]
#[command(name = "kutta", version = VERSION_INFO, about = "Kutta file server")]
pub struct Args {
    #[arg(
        short = 'p',
        long,
        env = "KUTTA_PORT",
        default_value_t = DEFAULT_PORT,
        help = "Port to serve on"
    )]
    pub port: u16,
    #[arg(
        short = 'd',
        long,
        env = "KUTTA_DIR",
        default_value = ".",
        help = "Directory to serve"
    )]
    pub dir: String,
    #[arg(
        short = 'b',
        long,
        env = "KUTTA_BIND",
        default_value = "0.0.0.0",
        help = "Bind address"
    )]
    pub bind: String,
    #[arg(long, env = "KUTTA_READ_ONLY", help = "Enable read-only mode")]
    pub read_only: bool,
    #[arg(long, env = "KUTTA_UPLOAD_ONLY", help = "Enable upload-only mode")]
    pub upload_only: bool,
    #[arg(
        long,
        env = "KUTTA_AUTH",
        default_value = "",
        help = "Enable basic auth in the format user:pass"
    )]
    pub auth: String,
    #[arg(long, env = "KUTTA_USER", help = "Drop privileges to this UNIX user")]
    pub user: Option<String>,
    #[arg(long, env = "KUTTA_LOG", help = "Path to log file")]
    pub log: Option<PathBuf>,
}

/// 启动后只读的服务配置。
#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub base_dir: PathBuf,
    pub read_only: bool,
    pub upload_only: bool,
    pub auth_credentials: Option<String>,
    pub uploads_only_listing: bool,
}

impl ServerConfig {
    /// 由命令行参数构建配置，基础目录转换为绝对路径。
    pub fn from_args(args: &Args) -> std::io::Result<Self> {
        let base_dir = absolute_base_dir(Path::new(&args.dir))?;
        let auth_credentials = if args.auth.is_empty() {
            None
        } else {
            Some(args.auth.clone())
        };
        Ok(Self {
            base_dir,
            read_only: args.read_only,
            upload_only: args.upload_only,
            auth_credentials,
            uploads_only_listing: args.port == DEFAULT_PORT,
        })
    }
}

fn absolute_base_dir(dir: &Path) -> std::io::Result<PathBuf> {
    let metadata = std::fs::metadata(dir)?;
    if !metadata.is_dir() {
        return Err(std::io::Error::new(
            std::io::ErrorKind::InvalidInput,
            format!("{} is not a directory", dir.display()),
        ));
    }
    dir.canonicalize()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn parse(extra: &[&str]) -> Args {
        let mut argv = vec!["kutta"];
        argv.extend_from_slice(extra);
        Args::try_parse_from(argv).expect("parse args")
    }

    #[test]
    fn default_port_enables_uploads_only_listing() {
        let temp = tempdir().expect("tempdir");
        let dir = temp.path().to_string_lossy().to_string();
        let config = ServerConfig::from_args(&parse(&["--dir", &dir])).expect("config");
        assert!(config.uploads_only_listing);
        assert!(config.auth_credentials.is_none());
        assert!(config.base_dir.is_absolute());

        let config =
            ServerConfig::from_args(&parse(&["--dir", &dir, "-p", "8080", "--auth", "bob:secret"]))
                .expect("config");
        assert!(!config.uploads_only_listing);
        assert_eq!(config.auth_credentials.as_deref(), Some("bob:secret"));
    }

    #[test]
    fn missing_base_dir_is_an_error() {
        let temp = tempdir().expect("tempdir");
        let missing = temp.path().join("nope").to_string_lossy().to_string();
        assert!(ServerConfig::from_args(&parse(&["--dir", &missing])).is_err());
    }
}
