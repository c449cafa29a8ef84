//! HID class requests on the control pipe.
//!
//! Only three are answered: GET_REPORT (always the all-keys-up report, so playback state
//! never leaks out of band), GET_IDLE and SET_IDLE. The idle rate is stored and reported
//! back, but nothing is retransmitted on idle.
//!
//! GET_REPORT answers from its own buffer and leaves the playback report counter alone, so
//! a host read never shifts the press/release alternation.

use crate::report::{Report, REPORT_LEN};

pub const HID_GET_REPORT: u8 = 0x01;
pub const HID_GET_IDLE: u8 = 0x02;
pub const HID_SET_IDLE: u8 = 0x0a;

/// A decoded class request
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ClassRequest {
    GetReport,
    GetIdle,
    /// Idle rate in 4 ms units (high byte of wValue)
    SetIdle { rate: u8 },
    Other(u8),
}

impl ClassRequest {
    pub fn decode(request: u8, value: u16) -> Self {
        match request {
            HID_GET_REPORT => ClassRequest::GetReport,
            HID_GET_IDLE => ClassRequest::GetIdle,
            HID_SET_IDLE => ClassRequest::SetIdle {
                rate: (value >> 8) as u8,
            },
            other => ClassRequest::Other(other),
        }
    }
}

/// What goes back to the host
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Reply {
    Report([u8; REPORT_LEN]),
    Idle(u8),
    /// Acknowledge without a payload
    NoData,
}

/// Control-pipe side of the keyboard: the report buffer handed out on GET_REPORT and the
/// idle rate.
#[derive(Clone, Debug, Default)]
pub struct ClassRequests {
    report: Report,
    idle_rate: u8,
}

impl ClassRequests {
    pub const fn new() -> Self {
        ClassRequests {
            report: Report::RELEASE,
            idle_rate: 0,
        }
    }

    pub fn handle(&mut self, request: ClassRequest) -> Reply {
        match request {
            ClassRequest::GetReport => {
                // We only have one report type, so wValue is not looked at
                self.report = Report::RELEASE;
                Reply::Report(self.report.as_bytes())
            }
            ClassRequest::GetIdle => Reply::Idle(self.idle_rate),
            ClassRequest::SetIdle { rate } => {
                self.idle_rate = rate;
                Reply::NoData
            }
            ClassRequest::Other(_) => Reply::NoData,
        }
    }

    pub fn idle_rate(&self) -> u8 {
        self.idle_rate
    }
}
