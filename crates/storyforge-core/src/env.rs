//! `define` table construction.
//!
//! Every environment variable supplied through the `env` preset is exposed to
//! bundled code as `process.env.KEY`, string-encoded as a JSON literal so the
//! bundler substitutes it verbatim.

use std::collections::BTreeMap;

use crate::codegen::js_string;
use crate::config::ConfigType;

/// Key the bundler substitutes with the build mode.
pub const NODE_ENV_KEY: &str = "process.env.NODE_ENV";

/// Build the `process.env.*` replacement table.
///
/// Order of precedence, later wins:
/// 1. `process.env.NODE_ENV` from the config type
/// 2. every entry of `envs`, as `process.env.<KEY>`
/// 3. `user_define`, copied through without re-encoding
#[must_use]
pub fn define_table(
    config_type: ConfigType,
    envs: &BTreeMap<String, String>,
    user_define: &BTreeMap<String, String>,
) -> BTreeMap<String, String> {
    let mut define = BTreeMap::new();

    define.insert(NODE_ENV_KEY.to_string(), js_string(config_type.node_env()));

    for (key, value) in envs {
        define.insert(format!("process.env.{key}"), js_string(value));
    }

    for (key, value) in user_define {
        define.insert(key.clone(), value.clone());
    }

    define
}

#[cfg(test)]
mod tests {
    use super::*;

    fn map(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect()
    }

    #[test]
    fn test_node_env_from_config_type() {
        let define = define_table(ConfigType::Production, &BTreeMap::new(), &BTreeMap::new());
        assert_eq!(define.get(NODE_ENV_KEY).unwrap(), "\"production\"");

        let define = define_table(ConfigType::Development, &BTreeMap::new(), &BTreeMap::new());
        assert_eq!(define.get(NODE_ENV_KEY).unwrap(), "\"development\"");
    }

    #[test]
    fn test_envs_are_string_encoded() {
        let envs = map(&[("API_URL", "https://api.example.com"), ("QUOTE", "say \"hi\"")]);
        let define = define_table(ConfigType::Development, &envs, &BTreeMap::new());

        assert_eq!(
            define.get("process.env.API_URL").unwrap(),
            "\"https://api.example.com\""
        );
        assert_eq!(define.get("process.env.QUOTE").unwrap(), r#""say \"hi\"""#);
    }

    #[test]
    fn test_env_can_override_node_env() {
        let envs = map(&[("NODE_ENV", "test")]);
        let define = define_table(ConfigType::Development, &envs, &BTreeMap::new());
        assert_eq!(define.get(NODE_ENV_KEY).unwrap(), "\"test\"");
    }

    #[test]
    fn test_user_define_applied_last() {
        let envs = map(&[("FLAG", "env")]);
        let user = map(&[("process.env.FLAG", "\"user\""), ("__DEV__", "true")]);
        let define = define_table(ConfigType::Development, &envs, &user);

        assert_eq!(define.get("process.env.FLAG").unwrap(), "\"user\"");
        assert_eq!(define.get("__DEV__").unwrap(), "true");
    }
}
