use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::{Context as _, Result};
use chrono::DateTime;
use chrono_tz::Tz;
use log::{info, warn};
use serenity::async_trait;
use serenity::model::gateway::{Activity, Ready};
use serenity::model::id::ChannelId;
use serenity::model::user::OnlineStatus;
use serenity::model::voice::VoiceState;
use serenity::prelude::*;
use serenity::utils::Colour;

use crate::app_config::AppConfig;
use crate::clock;
use crate::daily_reporter;
use crate::health;
use crate::idle_monitor;
use crate::notify::{self, Notice};
use crate::session_tracker::SessionTracker;

/// 음성 상태 변화의 종류
#[derive(Debug, PartialEq)]
enum VoiceTransition {
    /// 입장
    Join(ChannelId),
    /// 퇴장
    Leave(ChannelId),
    /// 채널 이동
    Move { from: ChannelId, to: ChannelId },
}

/// 이전/현재 채널을 비교해 변화의 종류를 판별한다
///
/// 같은 채널을 가리키는 이벤트 (뮤트 토글 등)는 집계 대상이 아니다
fn classify(old: Option<ChannelId>, new: Option<ChannelId>) -> Option<VoiceTransition> {
    match (old, new) {
        (None, Some(to)) => Some(VoiceTransition::Join(to)),
        (Some(from), None) => Some(VoiceTransition::Leave(from)),
        (Some(from), Some(to)) if from != to => Some(VoiceTransition::Move { from, to }),
        _ => None,
    }
}

/// 이벤트 수신 리스너
pub struct Handler {
    /// 설정
    app_config: AppConfig,
    /// 참여 시간 집계기
    tracker: Arc<SessionTracker>,
    /// 백그라운드 작업을 이미 띄웠는지 (재접속 시 ready가 다시 오므로)
    tasks_started: AtomicBool,
}

impl Handler {
    /// 생성자
    pub fn new(app_config: AppConfig) -> Self {
        Self {
            app_config,
            tracker: Arc::new(SessionTracker::new()),
            tasks_started: AtomicBool::new(false),
        }
    }

    /// 캐시에서 채널 이름을 찾는다
    fn channel_name(&self, ctx: &Context, channel: ChannelId) -> String {
        ctx.cache
            .guild_channel(channel)
            .map(|ch| ch.name)
            .unwrap_or_else(|| "알 수 없는 채널".to_string())
    }

    /// 입퇴장 임베드를 만들어 로그 채널로 보낸다
    async fn announce(
        &self,
        ctx: &Context,
        state: &VoiceState,
        transition: &VoiceTransition,
        at: DateTime<Tz>,
    ) -> Result<()> {
        // 닉네임이 있으면 닉네임, 없으면 계정 이름
        let name = state
            .member
            .as_ref()
            .map(|member| member.display_name().to_string())
            .unwrap_or_else(|| state.user_id.to_string());
        let thumbnail = state
            .member
            .as_ref()
            .and_then(|member| member.user.avatar_url());
        let timestamp = clock::format_timestamp(at);

        let notice = match transition {
            VoiceTransition::Join(to) => Notice {
                title: "✅ 입장".to_string(),
                description: format!(
                    "**{}** 님이 🎧 **{}** 에 입장하셨습니다!",
                    name,
                    self.channel_name(ctx, *to)
                ),
                colour: Colour::DARK_GREEN,
                fields: vec![
                    ("🕒 시간".to_string(), timestamp, false),
                    ("💬 메시지".to_string(), format!("파이팅 {}!", name), false),
                ],
                thumbnail,
            },
            VoiceTransition::Leave(from) => Notice {
                title: "⛔ 퇴장".to_string(),
                description: format!(
                    "**{}** 님이 🎧 **{}** 에서 퇴장하셨습니다!",
                    name,
                    self.channel_name(ctx, *from)
                ),
                colour: Colour::RED,
                fields: vec![
                    ("🕒 시간".to_string(), timestamp, false),
                    (
                        "💬 메시지".to_string(),
                        "수고했어! ~~(근데 조금 더 하지?!)~~".to_string(),
                        false,
                    ),
                ],
                thumbnail,
            },
            VoiceTransition::Move { from, to } => Notice {
                title: "🔁 이동".to_string(),
                description: format!(
                    "**{}** 님이 🎧 **{}** → **{}** 로 이동하셨습니다!",
                    name,
                    self.channel_name(ctx, *from),
                    self.channel_name(ctx, *to)
                ),
                colour: Colour::BLURPLE,
                fields: Vec::new(),
                thumbnail,
            },
        };

        notify::send(ctx, self.app_config.discord.activity_log_channel, notice)
            .await
            .context("입퇴장 알림의 전송에 실패")?;
        Ok(())
    }
}

#[async_trait]
impl EventHandler for Handler {
    /// 준비 완료 시에 호출된다
    async fn ready(&self, ctx: Context, _data_about_bot: Ready) {
        info!("Bot 준비 완료");
        ctx.set_presence(
            Some(Activity::playing("지켜보고 있다.👀")),
            OnlineStatus::Online,
        )
        .await;

        // 백그라운드 작업은 최초 ready에서 한 번만 띄운다
        if self.tasks_started.swap(true, Ordering::SeqCst) {
            return;
        }
        tokio::spawn(daily_reporter::run(
            ctx.clone(),
            self.app_config.clone(),
            Arc::clone(&self.tracker),
        ));
        tokio::spawn(idle_monitor::run(ctx.clone(), self.app_config.clone()));
        tokio::spawn(health::keep_alive(self.app_config.keep_alive.clone()));
    }

    /// 음성 상태가 바뀔 때 호출된다
    async fn voice_state_update(&self, ctx: Context, old: Option<VoiceState>, new: VoiceState) {
        let old_channel = old.and_then(|state| state.channel_id);
        let transition = match classify(old_channel, new.channel_id) {
            Some(transition) => transition,
            None => return, // 채널 변화가 없는 이벤트 (뮤트 등)
        };

        // 집계를 먼저 끝낸 뒤에 알림을 보낸다 (전송 실패가 집계에 영향을 주지 않도록)
        let now = clock::now();
        match transition {
            VoiceTransition::Join(_) => self.tracker.on_join(new.user_id, now).await,
            VoiceTransition::Leave(_) => self.tracker.on_leave(new.user_id, now).await,
            VoiceTransition::Move { .. } => self.tracker.on_move(new.user_id, now).await,
        }

        if let Err(why) = self.announce(&ctx, &new, &transition, now).await {
            warn!("입퇴장 알림에 실패: {:?}", why);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classify_detects_join_leave_move() {
        let a = ChannelId(1);
        let b = ChannelId(2);
        assert_eq!(classify(None, Some(a)), Some(VoiceTransition::Join(a)));
        assert_eq!(classify(Some(a), None), Some(VoiceTransition::Leave(a)));
        assert_eq!(
            classify(Some(a), Some(b)),
            Some(VoiceTransition::Move { from: a, to: b })
        );
    }

    #[test]
    fn classify_ignores_non_channel_changes() {
        let a = ChannelId(1);
        // 같은 채널 안에서의 상태 변화 (뮤트 토글 등)
        assert_eq!(classify(Some(a), Some(a)), None);
        assert_eq!(classify(None, None), None);
    }
}
