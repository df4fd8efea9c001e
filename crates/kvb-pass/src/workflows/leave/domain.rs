use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Ten-digit identifier printed on the student's confirmation and used at the gate.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ApplicationId(pub String);

impl fmt::Display for ApplicationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Matriculation number of a student.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct StudentId(pub String);

impl fmt::Display for StudentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Whether the student lives in the college dormitory or commutes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResidenceStatus {
    Dormitory,
    DayStudent,
}

impl ResidenceStatus {
    pub const fn ordered() -> [Self; 2] {
        [Self::Dormitory, Self::DayStudent]
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Dormitory => "Pelajar Asrama",
            Self::DayStudent => "Pelajar Harian",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().replace(['-', ' '], "_").as_str() {
            "dormitory" | "pelajar_asrama" | "asrama" => Some(Self::Dormitory),
            "day_student" | "pelajar_harian" | "harian" => Some(Self::DayStudent),
            _ => None,
        }
    }
}

/// Staff roles that can adjudicate a leave application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StaffRole {
    Hep,
    Warden,
}

impl StaffRole {
    pub const fn ordered() -> [Self; 2] {
        [Self::Hep, Self::Warden]
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Hep => "Ketua HEP",
            Self::Warden => "Warden Asrama",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "hep" | "khp" => Some(Self::Hep),
            "warden" => Some(Self::Warden),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApplicationStatus {
    Pending,
    Approved,
    Rejected,
}

impl ApplicationStatus {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
        }
    }

    pub const fn is_decided(self) -> bool {
        !matches!(self, Self::Pending)
    }
}

/// Reasons offered on the leave form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LeaveReason {
    MedicalAppointment,
    FamilyMatter,
    ReturnHome,
    BankingMatter,
    OfficialAppointment,
    FamilyEmergency,
    Other,
}

impl LeaveReason {
    pub const fn label(self) -> &'static str {
        match self {
            Self::MedicalAppointment => "Temu janji doktor/hospital",
            Self::FamilyMatter => "Urusan keluarga penting",
            Self::ReturnHome => "Pulang ke rumah",
            Self::BankingMatter => "Urusan bank/kewangan",
            Self::OfficialAppointment => "Temu janji rasmi",
            Self::FamilyEmergency => "Kecemasan keluarga",
            Self::Other => "Lain-lain",
        }
    }
}

/// Snapshot of the student profile taken at submission time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StudentSnapshot {
    pub student_id: StudentId,
    pub name: String,
    pub ic_number: String,
    pub class: String,
    pub residence: ResidenceStatus,
    #[serde(default)]
    pub dormitory_block: Option<String>,
    #[serde(default)]
    pub dormitory_room: Option<String>,
}

/// Requested departure and return, as entered on the form in campus-local time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaveWindow {
    pub exit_date: NaiveDate,
    pub exit_time: NaiveTime,
    pub return_date: NaiveDate,
    pub return_time: NaiveTime,
}

impl LeaveWindow {
    pub fn exit_at(&self) -> NaiveDateTime {
        self.exit_date.and_time(self.exit_time)
    }

    pub fn return_at(&self) -> NaiveDateTime {
        self.return_date.and_time(self.return_time)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmergencyContact {
    pub name: String,
    pub phone: String,
}

/// Inbound leave request as posted by the student form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaveSubmission {
    pub student: StudentSnapshot,
    pub reason: LeaveReason,
    #[serde(default)]
    pub custom_reason: Option<String>,
    pub window: LeaveWindow,
    pub destination: String,
    pub emergency_contact: EmergencyContact,
    #[serde(default)]
    pub supporting_documents: Vec<String>,
}

/// Person recording an approval or rejection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Approver {
    pub name: String,
    pub role: StaffRole,
}

/// Code shown to the security desk for an approved application.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DigitalPass(pub String);

/// Physical movement recorded at the gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SecurityAction {
    Exit,
    Return,
}

impl SecurityAction {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Exit => "Keluar",
            Self::Return => "Masuk",
        }
    }
}
