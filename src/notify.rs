use anyhow::{Context as _, Result};
use serenity::model::channel::Message;
use serenity::model::id::ChannelId;
use serenity::prelude::*;
use serenity::utils::Colour;

/// 채널로 보낼 알림 한 건
pub struct Notice {
    /// 제목
    pub title: String,
    /// 본문
    pub description: String,
    /// 색상 (분류별)
    pub colour: Colour,
    /// 추가 필드 (이름, 값, 인라인 여부)
    pub fields: Vec<(String, String, bool)>,
    /// 썸네일 URL
    pub thumbnail: Option<String>,
}

/// 알림을 임베드로 만들어 채널에 전송한다
pub async fn send(ctx: &Context, channel: ChannelId, notice: Notice) -> Result<Message> {
    channel
        .send_message(&ctx.http, |m| {
            m.embed(|e| {
                e.title(&notice.title);
                e.description(&notice.description);
                e.colour(notice.colour);
                e.fields(
                    notice
                        .fields
                        .iter()
                        .map(|(name, value, inline)| (name, value, *inline)),
                );
                if let Some(thumbnail) = &notice.thumbnail {
                    e.thumbnail(thumbnail);
                }
                e
            })
        })
        .await
        .with_context(|| format!("알림 전송에 실패: {}", notice.title))
}
