use super::domain::{EmergencyContact, LeaveReason, LeaveSubmission};

/// Validation errors raised before an application is stored.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IntakeViolation {
    #[error("{field} must not be blank")]
    MissingField { field: &'static str },
    #[error("a custom reason is required when the reason is \"Lain-lain\"")]
    CustomReasonRequired,
    #[error("emergency phone must contain {min}-{max} digits (found {found})")]
    InvalidEmergencyPhone { min: usize, max: usize, found: usize },
    #[error("return must be after exit")]
    ReturnNotAfterExit,
}

const DEFAULT_PHONE_DIGITS: (usize, usize) = (10, 12);

/// Bounds applied to submitted contact details.
#[derive(Debug, Clone, Copy)]
pub struct IntakePolicy {
    min_phone_digits: usize,
    max_phone_digits: usize,
}

impl IntakePolicy {
    pub fn new(min_phone_digits: usize, max_phone_digits: usize) -> Self {
        if min_phone_digits == 0 || min_phone_digits > max_phone_digits {
            return Self::default();
        }
        Self {
            min_phone_digits,
            max_phone_digits,
        }
    }

    pub fn phone_digit_range(&self) -> (usize, usize) {
        (self.min_phone_digits, self.max_phone_digits)
    }
}

impl Default for IntakePolicy {
    fn default() -> Self {
        Self {
            min_phone_digits: DEFAULT_PHONE_DIGITS.0,
            max_phone_digits: DEFAULT_PHONE_DIGITS.1,
        }
    }
}

/// Guard turning raw form submissions into normalized ones.
#[derive(Debug, Clone, Default)]
pub struct IntakeGuard {
    policy: IntakePolicy,
}

impl IntakeGuard {
    pub fn with_policy(policy: IntakePolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &IntakePolicy {
        &self.policy
    }

    /// Validate and normalize a submission: trims free text, strips the phone to
    /// digits and drops a custom reason that does not apply.
    pub fn accept(&self, submission: LeaveSubmission) -> Result<LeaveSubmission, IntakeViolation> {
        let LeaveSubmission {
            mut student,
            reason,
            custom_reason,
            window,
            destination,
            emergency_contact,
            supporting_documents,
        } = submission;

        student.student_id.0 = required(&student.student_id.0, "student_id")?;
        student.name = required(&student.name, "student name")?;
        student.ic_number = required(&student.ic_number, "ic_number")?;
        student.dormitory_block = optional(student.dormitory_block);
        student.dormitory_room = optional(student.dormitory_room);

        let custom_reason = match reason {
            LeaveReason::Other => Some(
                custom_reason
                    .as_deref()
                    .map(str::trim)
                    .filter(|text| !text.is_empty())
                    .ok_or(IntakeViolation::CustomReasonRequired)?
                    .to_string(),
            ),
            _ => None,
        };

        let destination = required(&destination, "destination")?;
        let contact_name = required(&emergency_contact.name, "emergency contact")?;
        let phone = self.phone_digits(&emergency_contact.phone)?;

        if window.return_at() <= window.exit_at() {
            return Err(IntakeViolation::ReturnNotAfterExit);
        }

        Ok(LeaveSubmission {
            student,
            reason,
            custom_reason,
            window,
            destination,
            emergency_contact: EmergencyContact {
                name: contact_name,
                phone,
            },
            supporting_documents: supporting_documents
                .into_iter()
                .filter_map(|name| optional(Some(name)))
                .collect(),
        })
    }

    fn phone_digits(&self, raw: &str) -> Result<String, IntakeViolation> {
        let digits: String = raw.chars().filter(char::is_ascii_digit).collect();
        let (min, max) = self.policy.phone_digit_range();
        if digits.len() < min || digits.len() > max {
            return Err(IntakeViolation::InvalidEmergencyPhone {
                min,
                max,
                found: digits.len(),
            });
        }
        Ok(digits)
    }
}

fn required(value: &str, field: &'static str) -> Result<String, IntakeViolation> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(IntakeViolation::MissingField { field });
    }
    Ok(trimmed.to_string())
}

fn optional(value: Option<String>) -> Option<String> {
    value
        .map(|text| text.trim().to_string())
        .filter(|text| !text.is_empty())
}
