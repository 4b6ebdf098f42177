//! 종목 리스트 항목.

use serde::{Deserialize, Serialize};

/// 종목 리스트 조회(ka10099) 결과의 한 항목.
///
/// 필터 판단에 필요한 필드만 보존하고 나머지 응답 필드는 무시합니다.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Instrument {
    /// 종목코드 (정상 종목은 6자리 숫자)
    #[serde(default)]
    pub code: String,
    /// 종목명
    #[serde(default)]
    pub name: String,
    /// 회사 분류명 (스팩, 리츠 등의 힌트)
    #[serde(rename = "companyClassName", default)]
    pub company_class: String,
}

impl Instrument {
    /// 새 종목 항목을 생성합니다.
    pub fn new(
        code: impl Into<String>,
        name: impl Into<String>,
        company_class: impl Into<String>,
    ) -> Self {
        Self {
            code: code.into(),
            name: name.into(),
            company_class: company_class.into(),
        }
    }
}
