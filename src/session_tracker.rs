use std::collections::HashMap;

use chrono::{DateTime, Duration};
use chrono_tz::Tz;
use futures::lock::Mutex;
use serenity::model::id::UserId;

use crate::clock;

/// 집계 상태 (두 맵은 항상 같은 락 아래에서 함께 갱신된다)
#[derive(Default)]
struct TrackerState {
    /// 진행 중인 세션의 시작 시각
    sessions: HashMap<UserId, DateTime<Tz>>,
    /// 마지막 리셋 이후 닫힌 세션의 누적 시간
    totals: HashMap<UserId, Duration>,
}

impl TrackerState {
    /// 열린 세션을 닫고 경과 시간을 누적 시간에 더한다
    ///
    /// 열린 세션이 없으면 (프로세스 재시작 등으로 상태가 어긋난 경우)
    /// 당일 자정부터 참여한 것으로 간주해 기록을 버리지 않는다
    fn close_session(&mut self, user: UserId, at: DateTime<Tz>) {
        let started = self
            .sessions
            .remove(&user)
            .unwrap_or_else(|| clock::local_midnight(at));
        let elapsed = (at - started).max(Duration::zero());
        let total = self.totals.entry(user).or_insert_with(Duration::zero);
        *total = *total + elapsed;
    }

    /// 누적 시간 + 열려 있는 세션의 경과 시간
    fn effective_total(&self, user: UserId, now: DateTime<Tz>) -> Duration {
        let closed = self.totals.get(&user).copied().unwrap_or_else(Duration::zero);
        let open = self
            .sessions
            .get(&user)
            .map(|started| (now - *started).max(Duration::zero()))
            .unwrap_or_else(Duration::zero);
        closed + open
    }
}

/// 음성 채널 참여 시간 집계기
///
/// 입장/퇴장/이동 이벤트를 받아 유저별 참여 시간을 계산한다.
/// 상태 전체를 하나의 락으로 감싸 이벤트 핸들러와 백그라운드 작업이
/// 동시에 접근해도 일관성이 깨지지 않는다.
pub struct SessionTracker {
    state: Mutex<TrackerState>,
}

impl SessionTracker {
    /// 빈 상태의 집계기를 만든다
    pub fn new() -> Self {
        Self {
            state: Mutex::new(TrackerState::default()),
        }
    }

    /// 음성 채널 입장: 세션을 시작한다
    ///
    /// 이미 열린 세션이 있으면 (중복 이벤트) 기존 시작 시각을 유지한다
    pub async fn on_join(&self, user: UserId, at: DateTime<Tz>) {
        let mut state = self.state.lock().await;
        state.sessions.entry(user).or_insert(at);
    }

    /// 음성 채널 퇴장: 세션을 닫고 경과 시간을 누적한다
    pub async fn on_leave(&self, user: UserId, at: DateTime<Tz>) {
        let mut state = self.state.lock().await;
        state.close_session(user, at);
    }

    /// 음성 채널 이동: 이전 세션을 닫고 같은 시각에 새 세션을 연다
    pub async fn on_move(&self, user: UserId, at: DateTime<Tz>) {
        // 닫기와 열기를 같은 락 아래에서 처리해 중간 상태가 보이지 않게 한다
        let mut state = self.state.lock().await;
        state.close_session(user, at);
        state.sessions.insert(user, at);
    }

    /// 지금까지의 참여 시간 (열린 세션 포함, 상태는 바꾸지 않음)
    pub async fn effective_total(&self, user: UserId, now: DateTime<Tz>) -> Duration {
        let state = self.state.lock().await;
        state.effective_total(user, now)
    }

    /// 모든 유저의 참여 시간을 초 단위로 스냅샷한다 (열린 세션 포함)
    pub async fn snapshot_all(&self, now: DateTime<Tz>) -> HashMap<UserId, i64> {
        let state = self.state.lock().await;
        state
            .totals
            .keys()
            .chain(state.sessions.keys())
            .map(|user| (*user, state.effective_total(*user, now).num_seconds()))
            .collect()
    }

    /// 집계 상태를 모두 비운다 (일일 리포트 후 호출)
    pub async fn reset_all(&self) {
        let mut state = self.state.lock().await;
        state.sessions.clear();
        state.totals.clear();
    }
}
