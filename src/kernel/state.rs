use serde::{Deserialize, Serialize};

/// The explicit states of one demo call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum CallState {
    /// Call menu, nothing in progress.
    #[default]
    Idle,
    IncomingUnflagged,
    /// Caller is on the blacklist; the spoken warning has already fired.
    IncomingFlagged,
    /// Ordinary call accepted, waiting on the recording-consent answer.
    AwaitingRecordingConsent,
    ActiveNoRecording,
    ActiveRecording,
    /// Blacklisted call accepted. Never records.
    ActiveFlaggedNoRecording,
    /// Recorded call finished, waiting on the save-or-discard answer.
    Ended,
}

impl CallState {
    pub fn is_incoming(&self) -> bool {
        matches!(
            self,
            CallState::IncomingUnflagged
                | CallState::IncomingFlagged
                | CallState::AwaitingRecordingConsent
        )
    }
}

/// Dialogs and banners the lifecycle asks the UI to show.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Prompt {
    RecordingConsent,
    /// Dismissible in-call alert after a transcript keyword hit.
    ScamAlert,
    /// "Was this actually a scam?" self-report.
    Feedback,
    SaveCall,
}

impl Prompt {
    pub fn text(&self) -> &'static str {
        match self {
            Prompt::RecordingConsent => {
                "Cho phép ElderShield ghi âm và phân tích nội dung cuộc trò chuyện để phát hiện dấu hiệu lừa đảo?"
            }
            Prompt::ScamAlert => "⚠️ CẢNH BÁO: Phát hiện dấu hiệu lừa đảo!",
            Prompt::Feedback => "Đây có phải là cuộc gọi lừa đảo không?",
            Prompt::SaveCall => "Bạn có muốn lưu lại dữ liệu cuộc gọi này không?",
        }
    }
}

/// Capabilities whose absence degrades a feature instead of failing it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Capability {
    LiveCapture,
    SpeechOutput,
}

/// Transient, non-blocking messages for the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Notice {
    CapabilityUnavailable(Capability),
    MicrophoneDenied,
    CaptureInterrupted,
    FeedbackThanks,
    CallSaved,
    CallDiscarded,
    SaveFailed,
}

impl Notice {
    pub fn text(&self) -> &'static str {
        match self {
            Notice::CapabilityUnavailable(Capability::LiveCapture) => {
                "Thiết bị không hỗ trợ nhận dạng giọng nói"
            }
            Notice::CapabilityUnavailable(Capability::SpeechOutput) => {
                "Thiết bị không hỗ trợ phát giọng nói"
            }
            Notice::MicrophoneDenied => "Không có quyền truy cập microphone",
            Notice::CaptureInterrupted => "Nhận dạng giọng nói bị gián đoạn",
            Notice::FeedbackThanks => "Cảm ơn phản hồi của bạn!",
            Notice::CallSaved => {
                "Dữ liệu đã được lưu, bạn có thể nghe lại trong mục dữ liệu cuộc gọi ở cài đặt"
            }
            Notice::CallDiscarded => "Đã xóa toàn bộ dữ liệu cuộc gọi, bạn hoàn toàn yên tâm",
            Notice::SaveFailed => "Không thể lưu dữ liệu cuộc gọi",
        }
    }
}
