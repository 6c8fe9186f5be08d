use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use proptest::prelude::*;
use taskexec::exec::{Executor, PortableExecutor};
use taskexec::interp::{Interpolator, ShellInterpolator, TaskEnv};
use taskexec::resources::Resources;

fn resources_strategy() -> impl Strategy<Value = Resources> {
    (any::<u32>(), any::<u64>(), any::<u64>(), any::<u32>()).prop_map(
        |(cpu, memory_mb, disk_mb, iops)| Resources {
            cpu,
            memory_mb,
            disk_mb,
            iops,
        },
    )
}

fn var_name() -> impl Strategy<Value = String> {
    "[A-Z][A-Z0-9_]{0,8}"
}

fn plain_value() -> impl Strategy<Value = String> {
    "[a-z0-9./-]{1,12}"
}

proptest! {
    // The portable variant accepts any resource spec without inspecting it.
    #[test]
    fn portable_limit_accepts_any_resources(resources in resources_strategy()) {
        let mut exec = PortableExecutor::new(Arc::new(ShellInterpolator), Duration::from_millis(100));
        prop_assert!(exec.limit(Some(&resources)).is_ok());
        prop_assert!(exec.limit(None).is_err());
    }

    #[test]
    fn known_variables_are_substituted(
        name in var_name(),
        value in plain_value(),
        prefix in plain_value(),
    ) {
        let vars = HashMap::from([(name.clone(), value.clone())]);
        let input = format!("{prefix}=${{{name}}} ${name}");

        let words = ShellInterpolator.parse_and_replace(&input, &vars).unwrap();
        prop_assert_eq!(words, vec![format!("{prefix}={value}"), value]);
    }

    #[test]
    fn unknown_variables_stay_verbatim(name in var_name(), word in plain_value()) {
        let vars: HashMap<String, String> = HashMap::new();
        let input = format!("{word} ${{{name}}}");

        let words = ShellInterpolator.parse_and_replace(&input, &vars).unwrap();
        prop_assert_eq!(words, vec![word, format!("${{{name}}}")]);
    }

    #[test]
    fn quoted_arguments_survive_as_single_words(
        args in proptest::collection::vec("[a-z ]{1,10}", 1..5),
    ) {
        let joined = shell_words::join(&args);
        let words = ShellInterpolator.parse_and_replace(&joined, &HashMap::new()).unwrap();
        prop_assert_eq!(words, args);
    }

    #[test]
    fn env_list_parsing_keeps_every_entry(
        entries in proptest::collection::btree_map(var_name(), plain_value(), 0..6),
    ) {
        let mut list: Vec<String> = entries.iter().map(|(k, v)| format!("{k}={v}")).collect();
        let env = TaskEnv::parse_from_list(&list).unwrap();
        list.sort();

        prop_assert_eq!(env.to_list(), list);
    }
}
