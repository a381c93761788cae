mod app_config;
mod clock;
mod daily_reporter;
mod event_handler;
mod health;
mod idle_monitor;
mod notify;
mod session_tracker;

use std::env;

use anyhow::{Context as _, Result};
use log::{error, LevelFilter};
use log4rs::append::console::ConsoleAppender;
use log4rs::config::{Appender, Root};
use log4rs::encode::pattern::PatternEncoder;
use serenity::prelude::*;

use crate::app_config::AppConfig;
use crate::event_handler::Handler;

/// 콘솔 로거를 초기화한다
fn init_logger() -> Result<()> {
    let stdout = ConsoleAppender::builder()
        .encoder(Box::new(PatternEncoder::new(
            "{d(%Y-%m-%d %H:%M:%S)} {h({l})} {t} - {m}{n}",
        )))
        .build();
    let config = log4rs::Config::builder()
        .appender(Appender::builder().build("stdout", Box::new(stdout)))
        .build(Root::builder().appender("stdout").build(LevelFilter::Info))
        .context("로거 설정의 구성에 실패")?;
    log4rs::init_config(config).context("로거의 초기화에 실패")?;
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    init_logger()?;

    // 설정을 읽는다
    let app_config = AppConfig::load_config().context("설정을 읽는 데 실패")?;

    // 토큰이 없으면 바로 종료한다
    let token = env::var("DISCORD_TOKEN").context("환경 변수 DISCORD_TOKEN이 설정되지 않음")?;

    // 외부 감시용 상태 확인 서버
    let health_port = app_config.health.port;
    tokio::spawn(async move {
        if let Err(why) = health::serve(health_port).await {
            error!("상태 확인 서버가 종료됨: {:?}", why);
        }
    });

    // 이벤트 리스너를 등록해 클라이언트를 시작한다
    let handler = Handler::new(app_config);
    let intents = GatewayIntents::GUILDS | GatewayIntents::GUILD_VOICE_STATES;
    let mut client = Client::builder(token, intents)
        .event_handler(handler)
        .await
        .context("클라이언트 생성에 실패")?;
    client.start().await.context("클라이언트 실행에 실패")?;

    Ok(())
}
