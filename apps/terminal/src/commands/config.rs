//! # Config Commands

use tracing::debug;

use crate::state::ConfigState;

/// Store settings for the till: name, currency, default tax, quote validity.
pub fn get_config(config: &ConfigState) -> ConfigState {
    debug!("get_config command");
    config.clone()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_db_path_is_not_exposed() {
        let config = ConfigState {
            db_path: Some("/var/lib/kaya/kaya.db".into()),
            ..Default::default()
        };

        let json = serde_json::to_value(get_config(&config)).unwrap();
        assert_eq!(json["storeName"], "Kaya POS");
        assert_eq!(json["quoteValidDays"], 7);
        assert!(json.get("dbPath").is_none());
    }
}
