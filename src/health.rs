use anyhow::{Context as _, Result};
use axum::routing::get;
use axum::Router;
use log::{debug, info};
use tokio::net::TcpListener;
use tokio::time::{sleep, Duration};

use crate::app_config::KeepAliveConfig;

/// 외부 감시용 상태 확인 서버를 띄운다 (GET /health → "OK")
pub async fn serve(port: u16) -> Result<()> {
    let app = Router::new().route("/health", get(|| async { "OK" }));
    let listener = TcpListener::bind(("0.0.0.0", port))
        .await
        .with_context(|| format!("상태 확인 서버의 바인드에 실패: {}", port))?;
    info!("상태 확인 서버 대기 중: 포트 {}", port);
    axum::serve(listener, app)
        .await
        .context("상태 확인 서버가 중단됨")?;
    Ok(())
}

/// 호스팅이 잠들지 않도록 주기적으로 외부 URL을 호출한다
///
/// 결과는 어느 쪽이든 무시한다 (실패해도 다음 주기에 다시 시도할 뿐)
pub async fn keep_alive(keep_alive: KeepAliveConfig) {
    let client = reqwest::Client::new();
    let period = Duration::from_secs(keep_alive.interval_min * 60);
    loop {
        sleep(period).await;
        if let Err(why) = client.get(&keep_alive.url).send().await {
            debug!("유휴 방지 핑에 실패 (무시): {:?}", why);
        }
    }
}
