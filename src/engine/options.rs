use super::mode::ExecutionMode;

/// 단일 시나리오 실행 옵션이다.
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    /// 이번 실행에 사용할 모드. 없으면 엔진 모드를 사용한다.
    pub mode: Option<ExecutionMode>,
    /// 시작 Step 인덱스. 기본값은 0이다.
    pub start_step: Option<usize>,
    /// 이 인덱스 직전까지만 실행한다. Step 수를 넘으면 잘린다.
    pub end_step: Option<usize>,
}

impl RunOptions {
    /// 기본 옵션을 생성한다.
    pub fn new() -> Self {
        Self::default()
    }

    /// 실행 모드를 지정한다.
    pub fn with_mode(mut self, mode: ExecutionMode) -> Self {
        self.mode = Some(mode);
        self
    }

    /// 시작 Step을 지정한다.
    pub fn with_start_step(mut self, start_step: usize) -> Self {
        self.start_step = Some(start_step);
        self
    }

    /// 종료 Step(미포함)을 지정한다.
    pub fn with_end_step(mut self, end_step: usize) -> Self {
        self.end_step = Some(end_step);
        self
    }
}

/// 일괄 실행 옵션이다.
#[derive(Debug, Clone, Default)]
pub struct RunAllOptions {
    /// 모든 시나리오에 적용할 모드.
    pub mode: Option<ExecutionMode>,
    /// 비어 있지 않으면 이 중 하나라도 가진 시나리오만 실행한다.
    pub tags: Vec<String>,
}

impl RunAllOptions {
    /// 기본 옵션을 생성한다.
    pub fn new() -> Self {
        Self::default()
    }

    /// 실행 모드를 지정한다.
    pub fn with_mode(mut self, mode: ExecutionMode) -> Self {
        self.mode = Some(mode);
        self
    }

    /// 태그 필터를 추가한다.
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.push(tag.into());
        self
    }
}
