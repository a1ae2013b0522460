use quiz_core::model::Certificate;

use crate::vm::time_fmt::format_date;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CertificateVm {
    pub number: String,
    pub learner: String,
    pub course_name: String,
    pub date_str: String,
}

impl CertificateVm {
    /// `learner` is the name printed on the certificate.
    #[must_use]
    pub fn new(certificate: &Certificate, learner: impl Into<String>) -> Self {
        Self {
            number: certificate.number.to_string(),
            learner: learner.into(),
            course_name: certificate.course_name.clone(),
            date_str: format_date(certificate.issued_at),
        }
    }
}

impl From<&Certificate> for CertificateVm {
    fn from(certificate: &Certificate) -> Self {
        Self::new(certificate, certificate.user_id.to_string())
    }
}
