//! Rotating file appender
//!
//! Rotates the log file by size, elapsed time or calendar period and keeps a
//! bounded number of numbered backups (`app.log.1`, `app.log.2`, ...),
//! optionally gzip-compressed.

use crate::core::appender::Appender;
use crate::core::error::{LoggerError, Result};
use crate::core::pattern::PatternFormatter;
use chrono::{DateTime, Datelike, Local, Timelike};
use serde::{Deserialize, Serialize};
use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

/// Rotation strategy defining when to rotate log files
///
/// # Examples
///
/// ```
/// use rust_logger_registry::appenders::RotationStrategy;
/// use std::time::Duration;
///
/// let size_strategy = RotationStrategy::Size { max_bytes: 1024 * 1024 };
/// let weekly = RotationStrategy::Weekly;
/// let hybrid = RotationStrategy::Hybrid {
///     max_bytes: 50 * 1024 * 1024,
///     interval: Duration::from_secs(24 * 3600),
/// };
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum RotationStrategy {
    /// Rotate when file exceeds size in bytes
    Size { max_bytes: u64 },

    /// Rotate at time interval
    Time { interval: Duration },

    /// Rotate daily at specified hour (0-23)
    Daily { hour: u8 },

    /// Rotate hourly
    Hourly,

    /// Rotate when the ISO week changes
    Weekly,

    /// Rotate when the calendar month changes
    Monthly,

    /// Rotate on size OR time, whichever comes first
    Hybrid { max_bytes: u64, interval: Duration },

    /// No rotation
    Never,
}

impl Default for RotationStrategy {
    fn default() -> Self {
        RotationStrategy::Size {
            max_bytes: 1024 * 1024,
        }
    }
}

impl RotationStrategy {
    #[must_use]
    pub fn size(max_bytes: u64) -> Self {
        RotationStrategy::Size { max_bytes }
    }

    #[must_use]
    pub fn time(interval: Duration) -> Self {
        RotationStrategy::Time { interval }
    }

    /// Create a daily rotation strategy
    ///
    /// # Panics
    ///
    /// Panics if hour is greater than 23
    #[must_use]
    pub fn daily(hour: u8) -> Self {
        assert!(hour <= 23, "Hour must be between 0 and 23");
        RotationStrategy::Daily { hour }
    }

    /// Parse a calendar frequency: `hourly`, `daily`, `weekly` or `monthly`.
    ///
    /// # Errors
    ///
    /// Returns [`LoggerError::InvalidConfiguration`] for other names.
    pub fn from_frequency(frequency: &str) -> Result<Self> {
        match frequency.trim().to_ascii_lowercase().as_str() {
            "hourly" => Ok(RotationStrategy::Hourly),
            "daily" => Ok(RotationStrategy::Daily { hour: 0 }),
            "weekly" => Ok(RotationStrategy::Weekly),
            "monthly" => Ok(RotationStrategy::Monthly),
            other => Err(LoggerError::config(
                "RotatingFileAppender",
                format!("unknown rotation frequency '{}'", other),
            )),
        }
    }
}

/// Rotation age as written in configuration: a calendar frequency name or a
/// number of seconds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RotationAge {
    Seconds(u64),
    Frequency(String),
}

/// Configuration for rotating file appender
///
/// # Examples
///
/// ```
/// use rust_logger_registry::appenders::{RotationPolicy, RotationStrategy};
///
/// let policy = RotationPolicy::new()
///     .with_strategy(RotationStrategy::Daily { hour: 2 })
///     .with_max_backups(30)
///     .with_compression(true);
/// assert_eq!(policy.max_file_size(), None);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct RotationPolicy {
    /// Rotation strategy defining when to rotate
    pub strategy: RotationStrategy,
    /// Maximum number of rotated files to keep
    pub max_backup_files: usize,
    /// Whether to compress rotated files
    pub compress: bool,
}

impl Default for RotationPolicy {
    fn default() -> Self {
        Self {
            strategy: RotationStrategy::default(),
            max_backup_files: 7,
            compress: false,
        }
    }
}

impl RotationPolicy {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a policy from the `size`, `age` and `keep` options.
    ///
    /// A frequency age rotates by calendar; a numeric age rotates after that
    /// many seconds. When both a size and an age are given the file rotates on
    /// whichever comes first.
    ///
    /// # Errors
    ///
    /// Returns [`LoggerError::InvalidConfiguration`] for an unknown frequency
    /// or a calendar frequency combined with a size.
    pub fn from_options(
        size: Option<u64>,
        age: Option<&RotationAge>,
        keep: Option<usize>,
    ) -> Result<Self> {
        let strategy = match (size, age) {
            (None, None) => RotationStrategy::default(),
            (Some(max_bytes), None) => RotationStrategy::Size { max_bytes },
            (None, Some(RotationAge::Seconds(secs))) => RotationStrategy::Time {
                interval: Duration::from_secs(*secs),
            },
            (Some(max_bytes), Some(RotationAge::Seconds(secs))) => RotationStrategy::Hybrid {
                max_bytes,
                interval: Duration::from_secs(*secs),
            },
            (None, Some(RotationAge::Frequency(freq))) => RotationStrategy::from_frequency(freq)?,
            (Some(_), Some(RotationAge::Frequency(freq))) => {
                return Err(LoggerError::config(
                    "RotatingFileAppender",
                    format!("size rotation cannot be combined with '{}' rotation", freq),
                ))
            }
        };

        let mut policy = Self::new().with_strategy(strategy);
        if let Some(keep) = keep {
            policy = policy.with_max_backups(keep);
        }
        Ok(policy)
    }

    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn with_strategy(mut self, strategy: RotationStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    /// Equivalent to `with_strategy(RotationStrategy::Size { max_bytes: size })`
    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn with_max_size(mut self, size: u64) -> Self {
        self.strategy = RotationStrategy::Size { max_bytes: size };
        self
    }

    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn with_max_backups(mut self, count: usize) -> Self {
        self.max_backup_files = count;
        self
    }

    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn with_compression(mut self, enabled: bool) -> Self {
        self.compress = enabled;
        self
    }

    /// Size limit, if the strategy rotates by size.
    #[must_use]
    pub fn max_file_size(&self) -> Option<u64> {
        match &self.strategy {
            RotationStrategy::Size { max_bytes } => Some(*max_bytes),
            RotationStrategy::Hybrid { max_bytes, .. } => Some(*max_bytes),
            _ => None,
        }
    }
}

/// Rotating file appender
///
/// # Examples
///
/// ```no_run
/// use rust_logger_registry::appenders::{RotatingFileAppender, RotationPolicy, RotationStrategy};
///
/// let policy = RotationPolicy::new()
///     .with_strategy(RotationStrategy::Weekly)
///     .with_max_backups(4);
/// let appender = RotatingFileAppender::with_policy("/var/log/app.log", policy).unwrap();
/// ```
pub struct RotatingFileAppender {
    base_path: PathBuf,
    policy: RotationPolicy,
    writer: Option<BufWriter<File>>,
    current_size: u64,
    last_rotation: SystemTime,
    formatter: PatternFormatter,
}

impl RotatingFileAppender {
    /// Create a rotating file appender with the default policy
    ///
    /// # Errors
    ///
    /// Returns error if file cannot be created or opened
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::with_policy(path, RotationPolicy::default())
    }

    /// Create a rotating file appender with a custom policy
    ///
    /// # Errors
    ///
    /// Returns error if the directory or file cannot be created or opened
    pub fn with_policy<P: AsRef<Path>>(path: P, policy: RotationPolicy) -> Result<Self> {
        let base_path = path.as_ref().to_path_buf();

        if let Some(parent) = base_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| {
                LoggerError::io_operation(
                    "create log directory",
                    format!("Failed to create directory '{}'", parent.display()),
                    e,
                )
            })?;
        }

        let (file, current_size, last_rotation) = Self::open(&base_path)?;

        Ok(Self {
            base_path,
            policy,
            writer: Some(BufWriter::new(file)),
            current_size,
            last_rotation,
            formatter: PatternFormatter::default(),
        })
    }

    #[must_use]
    pub fn with_formatter(mut self, formatter: PatternFormatter) -> Self {
        self.formatter = formatter;
        self
    }

    fn open(path: &Path) -> Result<(File, u64, SystemTime)> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(|e| {
                LoggerError::file_appender(path.display().to_string(), format!("Failed to open: {}", e))
            })?;

        let metadata = file.metadata().map_err(|e| {
            LoggerError::file_appender(
                path.display().to_string(),
                format!("Cannot access file metadata: {}", e),
            )
        })?;
        let last_rotation = metadata.modified().unwrap_or_else(|_| SystemTime::now());
        Ok((file, metadata.len(), last_rotation))
    }

    fn elapsed_since_rotation(&self) -> Duration {
        SystemTime::now()
            .duration_since(self.last_rotation)
            .unwrap_or(Duration::ZERO)
    }

    fn should_rotate(&self) -> bool {
        let now: DateTime<Local> = SystemTime::now().into();
        let last: DateTime<Local> = self.last_rotation.into();

        match &self.policy.strategy {
            RotationStrategy::Never => false,
            RotationStrategy::Size { max_bytes } => self.current_size >= *max_bytes,
            RotationStrategy::Time { interval } => self.elapsed_since_rotation() >= *interval,
            RotationStrategy::Daily { hour } => {
                now.date_naive() != last.date_naive() && now.hour() >= u32::from(*hour)
            }
            RotationStrategy::Hourly => {
                now.date_naive() != last.date_naive() || now.hour() != last.hour()
            }
            RotationStrategy::Weekly => now.iso_week() != last.iso_week(),
            RotationStrategy::Monthly => {
                now.year() != last.year() || now.month() != last.month()
            }
            RotationStrategy::Hybrid { max_bytes, interval } => {
                self.current_size >= *max_bytes || self.elapsed_since_rotation() >= *interval
            }
        }
    }

    fn rotate(&mut self) -> Result<()> {
        if let Some(mut writer) = self.writer.take() {
            writer.flush().map_err(|e| {
                LoggerError::file_rotation(
                    self.base_path.display().to_string(),
                    format!("Failed to flush before rotation: {}", e),
                )
            })?;
        }

        if self.policy.max_backup_files == 0 {
            // No backups kept: truncate in place
            if self.base_path.exists() {
                let _ = fs::remove_file(&self.base_path);
            }
        } else {
            let oldest = self.backup_path(self.policy.max_backup_files);
            for stale in [oldest.clone(), Self::gz_path(&oldest)] {
                if stale.exists() {
                    if let Err(e) = fs::remove_file(&stale) {
                        eprintln!("[WARN] Failed to remove oldest backup {}: {}", stale.display(), e);
                    }
                }
            }

            for i in (1..self.policy.max_backup_files).rev() {
                let old_path = self.backup_path(i);
                let new_path = self.backup_path(i + 1);
                let (old_path, new_path) = if Self::gz_path(&old_path).exists() {
                    (Self::gz_path(&old_path), Self::gz_path(&new_path))
                } else {
                    (old_path, new_path)
                };
                if old_path.exists() {
                    fs::rename(&old_path, &new_path).map_err(|e| {
                        LoggerError::file_rotation(
                            old_path.display().to_string(),
                            format!("Failed to rotate backup files: {}", e),
                        )
                    })?;
                }
            }

            let first = self.backup_path(1);
            if self.base_path.exists() {
                fs::rename(&self.base_path, &first).map_err(|e| {
                    LoggerError::file_rotation(
                        self.base_path.display().to_string(),
                        format!("Failed to rotate current log file: {}", e),
                    )
                })?;
                if self.policy.compress {
                    self.compress_file(&first)?;
                }
            }
        }

        let (file, _, _) = Self::open(&self.base_path)?;
        self.writer = Some(BufWriter::new(file));
        self.current_size = 0;
        self.last_rotation = SystemTime::now();
        Ok(())
    }

    fn backup_path(&self, index: usize) -> PathBuf {
        let mut path = self.base_path.clone();
        let filename = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("app.log")
            .to_string();
        path.set_file_name(format!("{}.{}", filename, index));
        path
    }

    fn gz_path(path: &Path) -> PathBuf {
        let mut name = path.as_os_str().to_os_string();
        name.push(".gz");
        PathBuf::from(name)
    }

    /// Gzip `path` into `path.gz`; the original is removed only after the
    /// compressed file is complete.
    fn compress_file(&self, path: &Path) -> Result<()> {
        use std::io::{BufReader, Read};

        let gz_path = Self::gz_path(path);
        let mut tmp_name = gz_path.as_os_str().to_os_string();
        tmp_name.push(".tmp");
        let temp_gz_path = PathBuf::from(tmp_name);

        let result = (|| -> std::io::Result<()> {
            let mut reader = BufReader::with_capacity(64 * 1024, File::open(path)?);
            let output = BufWriter::with_capacity(64 * 1024, File::create(&temp_gz_path)?);
            let mut encoder = flate2::write::GzEncoder::new(output, flate2::Compression::default());
            let mut buffer = vec![0u8; 64 * 1024];
            loop {
                let read = reader.read(&mut buffer)?;
                if read == 0 {
                    break;
                }
                encoder.write_all(&buffer[..read])?;
            }
            encoder.finish()?.flush()?;
            fs::rename(&temp_gz_path, &gz_path)
        })();

        if let Err(e) = result {
            let _ = fs::remove_file(&temp_gz_path);
            return Err(LoggerError::io_operation(
                "compress log file",
                format!("Failed to compress {}", path.display()),
                e,
            ));
        }

        if let Err(e) = fs::remove_file(path) {
            eprintln!(
                "[WARN] Compression succeeded but failed to remove original file {}: {}",
                path.display(),
                e
            );
        }
        Ok(())
    }

    #[must_use]
    pub fn current_size(&self) -> u64 {
        self.current_size
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.base_path
    }

    #[must_use]
    pub fn policy(&self) -> &RotationPolicy {
        &self.policy
    }

    #[must_use]
    pub fn last_rotation(&self) -> SystemTime {
        self.last_rotation
    }
}

impl Appender for RotatingFileAppender {
    fn name(&self) -> &str {
        self.base_path.to_str().unwrap_or("rotating_file")
    }

    fn formatter(&self) -> &PatternFormatter {
        &self.formatter
    }

    fn set_formatter(&mut self, formatter: PatternFormatter) {
        self.formatter = formatter;
    }

    fn write(&mut self, formatted: &str) -> Result<()> {
        if self.writer.is_some() && self.should_rotate() {
            if let Err(e) = self.rotate() {
                eprintln!("[WARN] Log rotation failed: {}. Continuing with current file.", e);
                if self.writer.is_none() {
                    let (file, size, last_rotation) = Self::open(&self.base_path)?;
                    self.writer = Some(BufWriter::new(file));
                    self.current_size = size;
                    self.last_rotation = last_rotation;
                }
                // Avoid retrying the rotation on every write
                self.current_size = 0;
                self.last_rotation = SystemTime::now();
            }
        }

        let writer = self
            .writer
            .as_mut()
            .ok_or_else(|| LoggerError::writer("Writer not initialized"))?;
        writer.write_all(formatted.as_bytes()).map_err(|e| {
            LoggerError::file_appender(
                self.base_path.display().to_string(),
                format!("Failed to write log entry: {}", e),
            )
        })?;
        self.current_size += formatted.len() as u64;
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        if let Some(ref mut writer) = self.writer {
            writer.flush().map_err(|e| {
                LoggerError::file_appender(
                    self.base_path.display().to_string(),
                    format!("Failed to flush: {}", e),
                )
            })?;
        }
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        self.flush()?;
        self.writer = None;
        Ok(())
    }
}

impl Drop for RotatingFileAppender {
    fn drop(&mut self) {
        if let Some(mut writer) = self.writer.take() {
            let _ = writer.flush();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::LogEvent;
    use std::thread;
    use tempfile::tempdir;

    fn line(i: usize) -> String {
        format!("Test message number {}\n", i)
    }

    #[test]
    fn test_policy_from_options() {
        let policy = RotationPolicy::from_options(Some(1024), None, Some(3)).unwrap();
        assert_eq!(policy.strategy, RotationStrategy::Size { max_bytes: 1024 });
        assert_eq!(policy.max_backup_files, 3);

        let weekly = RotationAge::Frequency("weekly".to_string());
        let policy = RotationPolicy::from_options(None, Some(&weekly), None).unwrap();
        assert_eq!(policy.strategy, RotationStrategy::Weekly);

        let secs = RotationAge::Seconds(60);
        let policy = RotationPolicy::from_options(Some(10), Some(&secs), None).unwrap();
        assert_eq!(policy.max_file_size(), Some(10));

        assert!(RotationPolicy::from_options(Some(10), Some(&weekly), None).is_err());
        let bogus = RotationAge::Frequency("fortnightly".to_string());
        assert!(RotationPolicy::from_options(None, Some(&bogus), None).is_err());
    }

    #[test]
    fn test_rotation_age_deserialize() {
        let age: RotationAge = serde_json::from_str("\"daily\"").unwrap();
        assert_eq!(age, RotationAge::Frequency("daily".to_string()));
        let age: RotationAge = serde_json::from_str("3600").unwrap();
        assert_eq!(age, RotationAge::Seconds(3600));
    }

    #[test]
    #[should_panic(expected = "Hour must be between 0 and 23")]
    fn test_daily_strategy_invalid_hour() {
        let _ = RotationStrategy::daily(24);
    }

    #[test]
    fn test_rotating_appender_creation() {
        let dir = tempdir().unwrap();
        let log_path = dir.path().join("nested").join("test.log");

        let appender = RotatingFileAppender::new(&log_path).unwrap();
        assert_eq!(appender.path(), log_path);
        assert_eq!(appender.current_size(), 0);
        assert_eq!(appender.name(), log_path.to_str().unwrap());
    }

    #[test]
    fn test_log_rotation_size_based() {
        let dir = tempdir().unwrap();
        let log_path = dir.path().join("rotation.log");
        let policy = RotationPolicy::new().with_max_size(100).with_max_backups(3);
        let mut appender = RotatingFileAppender::with_policy(&log_path, policy).unwrap();

        for i in 0..20 {
            appender.write(&line(i)).unwrap();
        }
        appender.flush().unwrap();

        assert!(log_path.with_file_name("rotation.log.1").exists());
        assert!(!log_path.with_file_name("rotation.log.4").exists());
    }

    #[test]
    fn test_log_rotation_time_based() {
        let dir = tempdir().unwrap();
        let log_path = dir.path().join("time_rotation.log");
        let policy = RotationPolicy::new()
            .with_strategy(RotationStrategy::Time {
                interval: Duration::from_millis(50),
            })
            .with_max_backups(3);
        let mut appender = RotatingFileAppender::with_policy(&log_path, policy).unwrap();

        appender.write("Initial message\n").unwrap();
        appender.flush().unwrap();
        thread::sleep(Duration::from_millis(60));
        appender.write("After interval\n").unwrap();
        appender.flush().unwrap();

        let backup = log_path.with_file_name("time_rotation.log.1");
        assert_eq!(fs::read_to_string(backup).unwrap(), "Initial message\n");
        assert_eq!(fs::read_to_string(&log_path).unwrap(), "After interval\n");
    }

    #[test]
    fn test_compressed_backups() {
        let dir = tempdir().unwrap();
        let log_path = dir.path().join("gz.log");
        let policy = RotationPolicy::new()
            .with_max_size(30)
            .with_max_backups(2)
            .with_compression(true);
        let mut appender = RotatingFileAppender::with_policy(&log_path, policy).unwrap();

        for i in 0..10 {
            appender.write(&line(i)).unwrap();
        }
        appender.flush().unwrap();

        assert!(dir.path().join("gz.log.1.gz").exists());
        assert!(!dir.path().join("gz.log.1").exists());
    }

    #[test]
    fn test_multiple_rotations_bounded() {
        let dir = tempdir().unwrap();
        let log_path = dir.path().join("multi.log");
        let policy = RotationPolicy::new().with_max_size(50).with_max_backups(2);
        let mut appender = RotatingFileAppender::with_policy(&log_path, policy).unwrap();

        for i in 0..100 {
            appender.write(&line(i)).unwrap();
        }
        appender.flush().unwrap();

        let log_files = fs::read_dir(dir.path())
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name().to_str().unwrap().starts_with("multi.log"))
            .count();
        assert_eq!(log_files, 3);
    }

    #[test]
    fn test_never_rotates() {
        let dir = tempdir().unwrap();
        let log_path = dir.path().join("never.log");
        let policy = RotationPolicy::new().with_strategy(RotationStrategy::Never);
        let mut appender = RotatingFileAppender::with_policy(&log_path, policy).unwrap();

        for i in 0..100 {
            appender.write(&line(i)).unwrap();
        }
        appender.flush().unwrap();
        assert!(!log_path.with_file_name("never.log.1").exists());
    }

    #[test]
    fn test_append_uses_layout_and_close_releases() {
        let dir = tempdir().unwrap();
        let log_path = dir.path().join("layout.log");
        let mut appender = RotatingFileAppender::new(&log_path)
            .unwrap()
            .with_formatter(PatternFormatter::from_pattern("%c %l %m\n").unwrap());

        appender.append(&LogEvent::new("svc", 2, "ready", None)).unwrap();
        appender.close().unwrap();

        assert_eq!(fs::read_to_string(&log_path).unwrap(), "svc INFO ready\n");
        assert!(appender.write("late\n").is_err());
    }
}
