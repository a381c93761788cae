use chrono::Timelike;
use log::{debug, warn};
use serenity::model::id::ChannelId;
use serenity::prelude::*;
use serenity::utils::Colour;
use tokio::time::{sleep, Duration};

use crate::app_config::AppConfig;
use crate::clock;
use crate::notify::{self, Notice};

/// 일정 주기로 음성 채널 참여 인원을 확인하고, 아무도 없으면 잔소리를 보낸다
pub async fn run(ctx: Context, app_config: AppConfig) {
    let period = Duration::from_secs(app_config.monitor.interval_min * 60);
    loop {
        sleep(period).await;

        let hour = clock::now().hour();
        if in_quiet_window(hour, app_config.monitor.quiet_until_hour) {
            debug!("조용한 시간대({}시)라 빈 채널 확인을 건너뜀", hour);
            continue;
        }

        let occupancy = match voice_occupancy(&ctx, app_config.discord.idle_nag_channel) {
            Some(occupancy) => occupancy,
            None => {
                // 캐시에서 채널을 찾지 못하면 이번 주기는 건너뛴다
                warn!("잔소리 채널을 찾을 수 없어 이번 확인을 건너뜀");
                continue;
            }
        };
        if !should_nag(hour, app_config.monitor.quiet_until_hour, occupancy) {
            debug!("음성 채널 참여 인원 {}명, 잔소리 생략", occupancy);
            continue;
        }

        if let Err(why) = notify::send(
            &ctx,
            app_config.discord.idle_nag_channel,
            Notice {
                title: "📢 음성 채널이 텅 비었어요".to_string(),
                description: "아무도 공부하고 있지 않네요... 다들 어디 갔나요? 😢".to_string(),
                colour: Colour::ORANGE,
                fields: Vec::new(),
                thumbnail: None,
            },
        )
        .await
        {
            warn!("잔소리 전송에 실패: {:?}", why);
        }
    }
}

/// 잔소리를 보내지 않는 시간대인지 (기준 시각 전의 새벽~아침)
fn in_quiet_window(hour: u32, quiet_until_hour: u32) -> bool {
    hour < quiet_until_hour
}

/// 잔소리를 보낼지 결정한다: 조용한 시간대가 아니면서 아무도 없을 때만
fn should_nag(hour: u32, quiet_until_hour: u32, occupancy: usize) -> bool {
    !in_quiet_window(hour, quiet_until_hour) && occupancy == 0
}

/// 길드 전체 음성 채널의 참여 인원 수 (캐시 기준)
fn voice_occupancy(ctx: &Context, channel: ChannelId) -> Option<usize> {
    let guild_id = ctx.cache.guild_channel(channel)?.guild_id;
    let guild = ctx.cache.guild(guild_id)?;
    Some(
        guild
            .voice_states
            .values()
            .filter(|state| state.channel_id.is_some())
            .count(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn early_hours_are_quiet() {
        assert!(in_quiet_window(3, 9));
        assert!(in_quiet_window(0, 9));
        assert!(in_quiet_window(8, 9));
    }

    #[test]
    fn daytime_is_not_quiet() {
        assert!(!in_quiet_window(9, 9));
        assert!(!in_quiet_window(10, 9));
        assert!(!in_quiet_window(23, 9));
    }

    #[test]
    fn nags_only_when_empty_outside_quiet_window() {
        // 낮 시간 + 빈 채널 → 잔소리
        assert!(should_nag(10, 9, 0));
        // 낮 시간이라도 누군가 있으면 보내지 않는다
        assert!(!should_nag(10, 9, 3));
        assert!(!should_nag(10, 9, 1));
    }

    #[test]
    fn quiet_window_suppresses_regardless_of_occupancy() {
        assert!(!should_nag(3, 9, 0));
        assert!(!should_nag(3, 9, 5));
    }
}
