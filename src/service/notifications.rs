//! Plain-text emails sent by the public flows.

use crate::config::Config;
use crate::db::models::{Lead, Subscriber};
use crate::service::mailer::OutgoingEmail;
use std::fmt::Write;

pub fn lead_notification(cfg: &Config, lead: &Lead) -> OutgoingEmail {
    let source = serde_json::to_value(lead.source)
        .ok()
        .and_then(|v| v.as_str().map(str::to_string))
        .unwrap_or_default();
    let mut text = String::new();
    let _ = writeln!(text, "New {source} lead #{}", lead.id);
    let _ = writeln!(text);
    let _ = writeln!(text, "Name: {}", lead.name);
    let _ = writeln!(text, "Email: {}", lead.email);
    for (label, value) in [
        ("Company", &lead.company),
        ("Phone", &lead.phone),
        ("Interested in", &lead.service_interest),
    ] {
        if let Some(v) = value {
            let _ = writeln!(text, "{label}: {v}");
        }
    }
    if let Some(message) = &lead.message {
        let _ = writeln!(text);
        let _ = writeln!(text, "{message}");
    }

    OutgoingEmail {
        to: vec![cfg.mail.notify_to.clone()],
        subject: format!("New lead: {} ({source})", lead.name),
        text,
        reply_to: Some(lead.email.clone()),
    }
}

pub fn contact_acknowledgement(lead: &Lead) -> OutgoingEmail {
    OutgoingEmail {
        to: vec![lead.email.clone()],
        subject: "We received your message".to_string(),
        text: format!(
            "Hi {},\n\nThanks for reaching out. A member of our security team will get back to you within one business day.\n",
            lead.name
        ),
        reply_to: None,
    }
}

pub fn newsletter_confirmation(cfg: &Config, subscriber: &Subscriber) -> OutgoingEmail {
    let confirm = cfg.site_link(&format!("/api/newsletter/confirm/{}", subscriber.confirm_token));
    let unsubscribe = cfg.site_link(&format!(
        "/api/newsletter/unsubscribe/{}",
        subscriber.unsubscribe_token
    ));
    OutgoingEmail {
        to: vec![subscriber.email.clone()],
        subject: "Confirm your newsletter subscription".to_string(),
        text: format!(
            "Please confirm your subscription:\n{confirm}\n\nIf you did not sign up, ignore this email or unsubscribe:\n{unsubscribe}\n"
        ),
        reply_to: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::models::{LeadSource, LeadStatus, SubscriberStatus};
    use chrono::Utc;

    #[test]
    fn lead_notification_lists_optional_fields() {
        let cfg = Config::default();
        let lead = Lead {
            id: 7,
            name: "Dana".into(),
            email: "dana@corp.example".into(),
            company: Some("Corp".into()),
            phone: None,
            message: Some("We need a pentest".into()),
            service_interest: None,
            source: LeadSource::Contact,
            status: LeadStatus::New,
            resource_id: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        let email = lead_notification(&cfg, &lead);
        assert_eq!(email.to, vec![cfg.mail.notify_to.clone()]);
        assert_eq!(email.subject, "New lead: Dana (contact)");
        assert!(email.text.contains("Company: Corp"));
        assert!(!email.text.contains("Phone"));
        assert_eq!(email.reply_to.as_deref(), Some("dana@corp.example"));
    }

    #[test]
    fn confirmation_links_point_at_the_api() {
        let cfg = Config::default();
        let sub = Subscriber {
            id: 1,
            email: "x@example.com".into(),
            name: None,
            status: SubscriberStatus::Pending,
            confirm_token: "ctok".into(),
            unsubscribe_token: "utok".into(),
            confirmed_at: None,
            unsubscribed_at: None,
            created_at: Utc::now(),
        };
        let email = newsletter_confirmation(&cfg, &sub);
        assert!(email.text.contains("http://localhost:3000/api/newsletter/confirm/ctok"));
        assert!(email.text.contains("/api/newsletter/unsubscribe/utok"));
    }
}
