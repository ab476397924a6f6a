/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use std::path::{Path, PathBuf};

use anyhow::{Context, anyhow};
use yaml_rust::{Yaml, YamlLoader, yaml};

use filog::FormatterKind;
use filog_types::{ChannelConfig, HeaderInfo, RollingFileConfig, Status};

const STATUS_FILE_NAME: &str = "status.json";

#[derive(Clone, Debug)]
pub struct FilogdConfig {
    pub listen_path: PathBuf,
    pub rolling: RollingFileConfig,
    pub channel: ChannelConfig,
    pub initial_status: Status,
    pub formatter: FormatterKind,
    pub header: HeaderInfo,
    pub status_file: Option<PathBuf>,
}

impl FilogdConfig {
    pub fn with_paths<P1: Into<PathBuf>, P2: Into<PathBuf>>(listen: P1, log_dir: P2) -> Self {
        FilogdConfig {
            listen_path: listen.into(),
            rolling: RollingFileConfig::with_dir(log_dir),
            channel: ChannelConfig::with_name("filog-write"),
            initial_status: Status::Enabled,
            formatter: FormatterKind::Default,
            header: HeaderInfo::default(),
            status_file: None,
        }
    }

    /// The status file defaults to living next to the log files, so a wiped
    /// log directory also resets the replicated status.
    pub fn status_file_path(&self) -> PathBuf {
        self.status_file
            .clone()
            .unwrap_or_else(|| self.rolling.dir.join(STATUS_FILE_NAME))
    }
}

pub fn load(path: &Path) -> anyhow::Result<FilogdConfig> {
    let contents = std::fs::read_to_string(path)
        .context(format!("failed to read config file {}", path.display()))?;
    let mut docs =
        YamlLoader::load_from_str(&contents).context("invalid yaml in config file")?;
    if docs.is_empty() {
        return Err(anyhow!("no yaml doc found in config file"));
    }
    match docs.swap_remove(0) {
        Yaml::Hash(map) => load_doc(&map),
        _ => Err(anyhow!("yaml doc root should be hash")),
    }
}

fn load_doc(map: &yaml::Hash) -> anyhow::Result<FilogdConfig> {
    let mut listen_path: Option<PathBuf> = None;
    let mut log_dir: Option<PathBuf> = None;
    let mut config = FilogdConfig::with_paths("", "");

    for (k, v) in map.iter() {
        let Yaml::String(k) = k else {
            return Err(anyhow!("all keys in main conf should be strings"));
        };
        match k.as_str() {
            "listen" => listen_path = Some(PathBuf::from(value_as_string(v)?)),
            "log_dir" => log_dir = Some(PathBuf::from(value_as_string(v)?)),
            "base_name" => config.rolling.base_name = value_as_string(v)?,
            "ext" => config.rolling.ext = value_as_string(v)?,
            "max_file_size_mb" => {
                let mb = value_as_f64(v)?;
                if mb <= 0.0 {
                    return Err(anyhow!("max_file_size_mb should be positive"));
                }
                config.rolling.set_max_file_size_in_mb(mb);
            }
            "max_backup" => config.rolling.max_backup = value_as_usize(v)?,
            "channel_capacity" => {
                let capacity = value_as_usize(v)?;
                if capacity == 0 {
                    return Err(anyhow!("channel_capacity should be positive"));
                }
                config.channel.capacity = capacity;
            }
            "initial_status" => {
                let s = value_as_string(v)?;
                config.initial_status = Status::from_name(&s)
                    .ok_or_else(|| anyhow!("unknown status name {s}"))?;
            }
            "formatter" => {
                let s = value_as_string(v)?;
                config.formatter = FormatterKind::from_name(&s)
                    .ok_or_else(|| anyhow!("unknown formatter name {s}"))?;
            }
            "app_name" => config.header.app_name = value_as_string(v)?,
            "app_version" => config.header.app_version = value_as_string(v)?,
            "status_file" => config.status_file = Some(PathBuf::from(value_as_string(v)?)),
            _ => return Err(anyhow!("invalid key {k} in main conf")),
        }
    }

    config.listen_path = listen_path.ok_or_else(|| anyhow!("no listen path set"))?;
    config.rolling.dir = log_dir.ok_or_else(|| anyhow!("no log_dir set"))?;
    Ok(config)
}

fn value_as_string(v: &Yaml) -> anyhow::Result<String> {
    match v {
        Yaml::String(s) => Ok(s.clone()),
        Yaml::Integer(i) => Ok(i.to_string()),
        Yaml::Real(s) => Ok(s.clone()),
        _ => Err(anyhow!("yaml value type for string should be scalar")),
    }
}

fn value_as_f64(v: &Yaml) -> anyhow::Result<f64> {
    match v {
        Yaml::Real(s) => s
            .parse::<f64>()
            .map_err(|e| anyhow!("invalid f64 value: {e}")),
        Yaml::Integer(i) => Ok(*i as f64),
        Yaml::String(s) => s
            .parse::<f64>()
            .map_err(|e| anyhow!("invalid f64 value: {e}")),
        _ => Err(anyhow!("yaml value type for f64 should be numeric")),
    }
}

fn value_as_usize(v: &Yaml) -> anyhow::Result<usize> {
    match v {
        Yaml::Integer(i) => {
            usize::try_from(*i).map_err(|e| anyhow!("invalid usize value: {e}"))
        }
        Yaml::String(s) => s
            .parse::<usize>()
            .map_err(|e| anyhow!("invalid usize value: {e}")),
        _ => Err(anyhow!("yaml value type for usize should be integer")),
    }
}
