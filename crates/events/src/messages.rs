//! Builders for the emails the portal sends.

use portal_core::lifecycle::ProjectAction;
use portal_core::notification::lifecycle_message;
use portal_core::otp::OtpPurpose;

use crate::mailer::OutgoingEmail;

const SUBJECT_PREFIX: &str = "[Research Portal]";

/// Email carrying a one-time passcode.
pub fn otp_email(to: &str, code: &str, purpose: OtpPurpose, expiry_mins: i64) -> OutgoingEmail {
    let (subject, intro) = match purpose {
        OtpPurpose::Login => ("Your sign-in code", "Use this code to sign in:"),
        OtpPurpose::EmailChange => (
            "Confirm your new email address",
            "Use this code to confirm your new email address:",
        ),
    };
    OutgoingEmail {
        to: to.to_string(),
        subject: format!("{SUBJECT_PREFIX} {subject}"),
        body: format!(
            "{intro}\n\n    {code}\n\nThe code expires in {expiry_mins} minutes. \
             If you did not request it, ignore this email."
        ),
    }
}

/// Email announcing a lifecycle transition. `project_url` is an absolute link.
pub fn lifecycle_email(
    to: &str,
    action: ProjectAction,
    project_title: &str,
    reason: Option<&str>,
    project_url: &str,
) -> OutgoingEmail {
    let (title, message) = lifecycle_message(action, project_title, reason);
    OutgoingEmail {
        to: to.to_string(),
        subject: format!("{SUBJECT_PREFIX} {title}"),
        body: format!("{message}\n\nOpen the project: {project_url}"),
    }
}
