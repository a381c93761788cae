use std::collections::HashMap;
use std::sync::Arc;

use anyhow::Result;
use log::{debug, info, warn};
use serenity::model::id::UserId;
use serenity::prelude::*;
use serenity::utils::Colour;
use tokio::time::sleep;

use crate::app_config::AppConfig;
use crate::clock;
use crate::notify::{self, Notice};
use crate::session_tracker::SessionTracker;

/// 리포트 주기 한 번의 결과 (집계 리셋 여부를 가른다)
#[derive(Debug, PartialEq)]
enum ReportOutcome {
    /// 전송을 시도함 (성공/실패와 무관하게 리셋)
    Attempted,
    /// 채널을 찾지 못해 아무것도 내보내지 못함 (집계를 유지하고 다음 자정에 재시도)
    ChannelMissing,
}

/// 이번 주기에 집계를 리셋할지 결정한다
///
/// 전송을 시도한 뒤의 실패는 리포트 한 번을 놓치는 것으로 받아들이고 리셋한다
/// (집계가 한없이 불어나는 쪽보다 낫다). 채널 자체를 찾지 못해 아무것도
/// 내보내지 못한 경우만 집계를 남겨 둔다
fn should_reset(outcome: &Result<ReportOutcome>) -> bool {
    !matches!(outcome, Ok(ReportOutcome::ChannelMissing))
}

/// 매일 자정에 누적 참여 시간을 리포트하고 집계를 리셋한다
///
/// 매 주기마다 다음 자정까지 남은 시간을 벽시계로 다시 계산하므로
/// 작업이 늦게 깨어나도 기준 시각이 밀리지 않는다
pub async fn run(ctx: Context, app_config: AppConfig, tracker: Arc<SessionTracker>) {
    loop {
        let now = clock::now();
        let next = clock::next_midnight(now);
        let wait = (next - now).to_std().unwrap_or_default();
        debug!("다음 일일 리포트까지 {}초 대기", wait.as_secs());
        sleep(wait).await;

        let outcome = report_once(&ctx, &app_config, &tracker).await;
        match &outcome {
            Ok(ReportOutcome::Attempted) => {}
            Ok(ReportOutcome::ChannelMissing) => {
                warn!("리포트 채널을 찾을 수 없어 이번 리포트를 건너뜀 (집계 유지)");
            }
            Err(why) => warn!("일일 리포트 전송에 실패: {:?}", why),
        }

        if should_reset(&outcome) {
            tracker.reset_all().await;
            info!("일일 집계를 리셋");
        }
    }
}

/// 리포트 한 건을 만들어 전송한다
async fn report_once(
    ctx: &Context,
    app_config: &AppConfig,
    tracker: &SessionTracker,
) -> Result<ReportOutcome> {
    let channel = app_config.discord.activity_log_channel;
    // 멤버 이름을 찾기 위해 채널이 속한 길드를 알아낸다
    let guild_id = match ctx.cache.guild_channel(channel).map(|ch| ch.guild_id) {
        Some(guild_id) => guild_id,
        None => return Ok(ReportOutcome::ChannelMissing),
    };

    let now = clock::now();
    // 열린 세션을 건드리지 않고 현재 시점 기준으로 스냅샷
    let totals = tracker.snapshot_all(now).await;

    let mut fields = Vec::new();
    if totals.is_empty() {
        fields.push((
            "😴 활동 없음".to_string(),
            "오늘은 아무도 음성 채널에 참여하지 않았어요!".to_string(),
            false,
        ));
    } else {
        for (user_id, seconds) in rank(totals) {
            // 길드에서 찾을 수 없는 멤버는 리포트에서 뺀다
            let member = match guild_id.member(ctx, user_id).await {
                Ok(member) => member,
                Err(why) => {
                    debug!("멤버 조회에 실패해 리포트에서 제외: {} ({:?})", user_id, why);
                    continue;
                }
            };
            fields.push((
                format!("🎧 {}", member.display_name()),
                format!("{} 동안 참여했습니다!", format_duration(seconds)),
                false,
            ));
        }
    }

    notify::send(
        ctx,
        channel,
        Notice {
            title: "🕛 오늘의 공부 누적 시간".to_string(),
            description: format!("🗓 {} 기준", clock::format_date(now)),
            colour: Colour::GOLD,
            fields,
            thumbnail: None,
        },
    )
    .await?;
    Ok(ReportOutcome::Attempted)
}

/// 참여 시간이 긴 순서로 정렬한다 (같으면 유저ID 순)
fn rank(totals: HashMap<UserId, i64>) -> Vec<(UserId, i64)> {
    let mut entries = totals.into_iter().collect::<Vec<_>>();
    entries.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
    entries
}

/// 초 단위 시간을 "H시간 M분 S초"로 포맷한다
pub fn format_duration(total_seconds: i64) -> String {
    let hours = total_seconds / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;
    format!("{}시간 {}분 {}초", hours, minutes, seconds)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duration_splits_into_hours_minutes_seconds() {
        assert_eq!(format_duration(3661), "1시간 0분 1초");
        assert_eq!(format_duration(59), "0시간 0분 59초");
        assert_eq!(format_duration(1500), "0시간 25분 0초");
        assert_eq!(format_duration(0), "0시간 0분 0초");
    }

    #[test]
    fn rank_sorts_by_descending_seconds() {
        let totals = HashMap::from([(UserId(2), 59), (UserId(1), 3661)]);
        assert_eq!(rank(totals), vec![(UserId(1), 3661), (UserId(2), 59)]);
    }

    #[test]
    fn reset_follows_any_send_attempt() {
        assert!(should_reset(&Ok(ReportOutcome::Attempted)));
        // 전송 실패도 시도는 한 것이므로 하루 단위 리셋은 그대로 진행한다
        assert!(should_reset(&Err(anyhow::anyhow!("전송 실패"))));
    }

    #[test]
    fn missing_channel_keeps_the_accumulated_totals() {
        // 아무것도 내보내지 못했으면 집계를 비우지 않고 다음 자정에 다시 시도한다
        assert!(!should_reset(&Ok(ReportOutcome::ChannelMissing)));
    }

    #[test]
    fn rank_breaks_ties_by_user_id() {
        let totals = HashMap::from([(UserId(3), 100), (UserId(1), 100), (UserId(2), 200)]);
        assert_eq!(
            rank(totals),
            vec![(UserId(2), 200), (UserId(1), 100), (UserId(3), 100)]
        );
    }
}
