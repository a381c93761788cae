use anyhow::{Context as _, Result};
use config::Config;
use serenity::model::id::ChannelId;

/// Discord 설정
#[derive(Debug, Default, serde::Deserialize, PartialEq, Clone)]
pub struct DiscordConfig {
    /// 입퇴장 로그와 일일 리포트를 보낼 채널ID
    pub activity_log_channel: ChannelId,
    /// 빈 채널 잔소리를 보낼 채널ID
    pub idle_nag_channel: ChannelId,
}

/// 빈 채널 확인 설정
#[derive(Debug, Default, serde::Deserialize, PartialEq, Clone)]
pub struct MonitorConfig {
    /// 확인 주기 (분)
    pub interval_min: u64,
    /// 이 시각 전에는 잔소리를 보내지 않음 (현지 시각, 시)
    pub quiet_until_hour: u32,
}

/// 유휴 방지 핑 설정
#[derive(Debug, Default, serde::Deserialize, PartialEq, Clone)]
pub struct KeepAliveConfig {
    /// 주기적으로 호출할 외부 URL
    pub url: String,
    /// 호출 주기 (분)
    pub interval_min: u64,
}

/// 상태 확인 서버 설정
#[derive(Debug, Default, serde::Deserialize, PartialEq, Clone)]
pub struct HealthConfig {
    /// 수신 포트
    pub port: u16,
}

/// 애플리케이션 설정
#[derive(Debug, Default, serde::Deserialize, PartialEq, Clone)]
pub struct AppConfig {
    /// Discord 설정
    pub discord: DiscordConfig,
    /// 빈 채널 확인 설정
    pub monitor: MonitorConfig,
    /// 유휴 방지 핑 설정
    pub keep_alive: KeepAliveConfig,
    /// 상태 확인 서버 설정
    pub health: HealthConfig,
}

impl AppConfig {
    /// 설정을 읽어들인다
    pub fn load_config() -> Result<AppConfig> {
        // 설정 파일을 읽는다
        let config = Config::builder()
            // Add in `./config.toml`
            .add_source(config::File::with_name("config.toml"))
            // Add in settings from the environment (with a prefix of APP)
            // Eg.. `APP_DEBUG=1 ./target/app` would set the `debug` key
            .add_source(config::Environment::with_prefix("APP"))
            .build()?;
        // 설정 파일을 파싱한다
        let app_config = config
            .try_deserialize::<AppConfig>()
            .context("설정 파일을 읽는 데 실패")?;
        Ok(app_config)
    }
}
