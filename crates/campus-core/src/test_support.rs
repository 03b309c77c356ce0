//! Fixtures shared by unit tests across modules.

use chrono::{DateTime, TimeZone, Utc};

use crate::models::{Program, ProgramId};

/// Midnight UTC on the given day.
pub fn day(year: i32, month: u32, day: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(year, month, day, 0, 0, 0).unwrap()
}

/// A fully populated program updated on `2023-06-<day_of_june> 08:00 UTC`.
pub fn sample_program(id: i64, name: &str, day_of_june: u32) -> Program {
    Program {
        id: ProgramId::new(id),
        name: name.to_string(),
        description: format!("{name} description"),
        bacc: true,
        location: "Antananarivo".to_string(),
        inscription_open: Some("2023-07-01".to_string()),
        inscription_closed: Some("2023-09-30".to_string()),
        fees: Some("150000".to_string()),
        bank_account: Some("00012 34567".to_string()),
        bank_account_owner: Some("Université".to_string()),
        admission: Some("Dossier".to_string()),
        document: None,
        domain: "Sciences".to_string(),
        updated_at: Utc.with_ymd_and_hms(2023, 6, day_of_june, 8, 0, 0).unwrap(),
    }
}
