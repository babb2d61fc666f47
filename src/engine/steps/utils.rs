use std::any::Any;

/// panic payload에서 사람이 읽을 수 있는 메시지를 꺼낸다.
pub(super) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        return (*message).to_string();
    }
    if let Some(message) = payload.downcast_ref::<String>() {
        return message.clone();
    }
    "알 수 없는 panic".to_string()
}

/// assertion 실패 메시지를 정한다. 비어 있으면 기본 문구를 사용한다.
pub(super) fn assertion_failure_message(position: usize, message: String) -> String {
    if message.trim().is_empty() {
        format!("Assertion #{position} 실패")
    } else {
        message
    }
}
