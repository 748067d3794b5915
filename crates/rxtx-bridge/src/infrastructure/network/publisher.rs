//! Discovery publisher that logs instead of answering mDNS queries.

use rxtx_core::ServiceAdvert;
use tracing::{info, trace, warn};

use crate::application::ports::ServicePublisher;

/// [`ServicePublisher`] that records the active advert and logs it.
#[derive(Debug, Default, Clone)]
pub struct LogPublisher {
    active: Option<ServiceAdvert>,
}

impl LogPublisher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn active(&self) -> Option<&ServiceAdvert> {
        self.active.as_ref()
    }
}

impl ServicePublisher for LogPublisher {
    fn publish(&mut self, advert: &ServiceAdvert) -> bool {
        if advert.instance.is_empty() || advert.service_type.is_empty() {
            warn!(instance = %advert.instance, service = %advert.service_type, "advert needs a name and a service type");
            return false;
        }
        info!(
            host = %advert.host_name(),
            service = %advert.service_label(),
            port = advert.port,
            txt = ?advert.txt,
            "service published"
        );
        self.active = Some(advert.clone());
        true
    }

    fn refresh(&mut self) {
        if let Some(advert) = &self.active {
            trace!(host = %advert.host_name(), "responder refreshed");
        }
    }

    fn withdraw(&mut self) {
        if let Some(advert) = self.active.take() {
            info!(host = %advert.host_name(), "service withdrawn");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rxtx_core::SettingsRecord;

    #[test]
    fn test_publish_then_withdraw() {
        // Arrange
        let mut record = SettingsRecord::default();
        record.set_name("bridge");
        let advert = ServiceAdvert::from_record(&record);
        let mut publisher = LogPublisher::new();

        // Act
        let published = publisher.publish(&advert);

        // Assert
        assert!(published);
        assert_eq!(publisher.active(), Some(&advert));
        publisher.withdraw();
        assert!(publisher.active().is_none());
    }

    #[test]
    fn test_unnamed_advert_is_rejected() {
        let advert = ServiceAdvert::from_record(&SettingsRecord::default());
        let mut publisher = LogPublisher::new();

        assert!(!publisher.publish(&advert));
        assert!(publisher.active().is_none());
    }
}
