use super::events::EngineEvent;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

/// 구독 해지에 사용하는 식별자이다.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

/// 구독 식별자와 이벤트 수신 채널 묶음이다.
#[derive(Debug)]
pub struct EventSubscription {
    /// `unsubscribe`에 넘길 식별자.
    pub id: SubscriptionId,
    /// 이벤트 수신 채널.
    pub events: UnboundedReceiver<EngineEvent>,
}

/// 엔진 이벤트를 여러 구독자에게 중계하는 헬퍼이다.
#[derive(Clone, Debug)]
pub struct EventHub {
    /// 내부 상태를 보관한다.
    inner: Arc<EventHubInner>,
}

/// EventHub 내부 구현체이다.
#[derive(Debug)]
struct EventHubInner {
    /// 다음 구독 ID를 생성하기 위한 카운터이다.
    next_id: AtomicU64,
    /// 구독 ID와 송신 채널 목록. 등록 순서대로 전달한다.
    subscribers: Mutex<Vec<(u64, UnboundedSender<EngineEvent>)>>,
}

impl EventHub {
    /// 구독자가 없는 허브를 생성한다.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(EventHubInner {
                next_id: AtomicU64::new(1),
                subscribers: Mutex::new(Vec::new()),
            }),
        }
    }

    /// 새 구독자를 등록하고 수신 채널을 반환한다.
    pub fn subscribe(&self) -> EventSubscription {
        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
        let (tx, rx) = mpsc::unbounded_channel();
        self.inner
            .subscribers
            .lock()
            .expect("EventHub mutex poisoned")
            .push((id, tx));
        EventSubscription {
            id: SubscriptionId(id),
            events: rx,
        }
    }

    /// 구독을 해지한다. 등록되어 있던 경우 `true`를 반환한다.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut guard = self
            .inner
            .subscribers
            .lock()
            .expect("EventHub mutex poisoned");
        let before = guard.len();
        guard.retain(|(sub_id, _)| *sub_id != id.0);
        guard.len() != before
    }

    /// 모든 구독자에게 이벤트를 보낸다. 수신 측이 닫힌 구독은 정리한다.
    pub fn emit(&self, event: EngineEvent) {
        let mut guard = self
            .inner
            .subscribers
            .lock()
            .expect("EventHub mutex poisoned");
        guard.retain(|(_, tx)| tx.send(event.clone()).is_ok());
    }

    /// 현재 구독자 수를 반환한다.
    pub fn subscriber_count(&self) -> usize {
        self.inner
            .subscribers
            .lock()
            .expect("EventHub mutex poisoned")
            .len()
    }
}

impl Default for EventHub {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn error_event(message: &str) -> EngineEvent {
        EngineEvent::Error {
            message: message.to_string(),
            step_index: 0,
        }
    }

    #[test]
    fn every_subscriber_receives_events_until_unsubscribed() {
        let hub = EventHub::new();
        let mut first = hub.subscribe();
        let mut second = hub.subscribe();

        hub.emit(error_event("a"));
        assert!(hub.unsubscribe(first.id));
        assert!(!hub.unsubscribe(first.id));
        hub.emit(error_event("b"));

        assert!(matches!(first.events.try_recv(), Ok(EngineEvent::Error { message, .. }) if message == "a"));
        assert!(first.events.try_recv().is_err());
        assert!(matches!(second.events.try_recv(), Ok(EngineEvent::Error { message, .. }) if message == "a"));
        assert!(matches!(second.events.try_recv(), Ok(EngineEvent::Error { message, .. }) if message == "b"));
    }

    #[test]
    fn dropped_receivers_are_pruned_on_emit() {
        let hub = EventHub::new();
        let kept = hub.subscribe();
        drop(hub.subscribe());
        assert_eq!(2, hub.subscriber_count());

        hub.emit(error_event("x"));

        assert_eq!(1, hub.subscriber_count());
        drop(kept);
    }
}
