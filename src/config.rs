use crate::engine::ExecutionMode;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::time::Duration;

/// 엔진의 기본 실행 모드와 지연 시간 설정이다.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// 실행 옵션에 모드가 없을 때 사용할 모드.
    #[serde(default)]
    pub default_mode: ExecutionMode,
    /// automated 모드의 Step 간 지연(ms).
    #[serde(default)]
    pub step_delay_ms: u64,
    /// interactive 모드의 Step 간 지연(ms).
    #[serde(default = "default_interactive_delay")]
    pub interactive_delay_ms: u64,
    /// 일시정지 대기 제한(ms). 없으면 무기한 대기한다.
    #[serde(default)]
    pub pause_timeout_ms: Option<u64>,
}

impl EngineConfig {
    /// automated 모드 지연을 Duration으로 반환한다.
    pub fn step_delay(&self) -> Duration {
        Duration::from_millis(self.step_delay_ms)
    }

    /// interactive 모드 지연을 Duration으로 반환한다.
    pub fn interactive_delay(&self) -> Duration {
        Duration::from_millis(self.interactive_delay_ms)
    }

    /// 일시정지 대기 제한을 Duration으로 반환한다.
    pub fn pause_timeout(&self) -> Option<Duration> {
        self.pause_timeout_ms.map(Duration::from_millis)
    }
}

impl Default for EngineConfig {
    /// 전속력 automated 실행과 1초 간격 interactive 실행을 기본값으로 한다.
    fn default() -> Self {
        Self {
            default_mode: ExecutionMode::default(),
            step_delay_ms: 0,
            interactive_delay_ms: default_interactive_delay(),
            pause_timeout_ms: None,
        }
    }
}

fn default_interactive_delay() -> u64 {
    1000
}

/// YAML 파일을 읽어 EngineConfig로 역직렬화한다.
pub fn load_config_from_file(path: &Path) -> anyhow::Result<EngineConfig> {
    let mut file = File::open(path)?;
    load_config_from_reader(&mut file)
}

/// Reader에서 YAML을 읽어 EngineConfig로 파싱한다.
pub fn load_config_from_reader<R: Read>(reader: &mut R) -> anyhow::Result<EngineConfig> {
    let mut buf = String::new();
    reader.read_to_string(&mut buf)?;
    if buf.trim().is_empty() {
        return Ok(EngineConfig::default());
    }
    let config: EngineConfig = serde_yaml::from_str(&buf)?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_fall_back_to_defaults() {
        let yaml = "default_mode: interactive\npause_timeout_ms: 5000\n";
        let config = load_config_from_reader(&mut yaml.as_bytes()).expect("설정 파싱 실패");

        assert_eq!(ExecutionMode::Interactive, config.default_mode);
        assert_eq!(Duration::ZERO, config.step_delay());
        assert_eq!(Duration::from_millis(1000), config.interactive_delay());
        assert_eq!(Some(Duration::from_secs(5)), config.pause_timeout());
    }

    #[test]
    fn empty_document_yields_default_config() {
        let config = load_config_from_reader(&mut "".as_bytes()).expect("설정 파싱 실패");
        assert_eq!(EngineConfig::default(), config);
    }

    #[test]
    fn unknown_mode_is_rejected() {
        let yaml = "default_mode: warp\n";
        assert!(load_config_from_reader(&mut yaml.as_bytes()).is_err());
    }
}
