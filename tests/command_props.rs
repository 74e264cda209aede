use proptest::prelude::*;

use gmxflow::exec::CommandBuilder;
use gmxflow::types::{OptionSet, OptionValue, RESERVED_OPTIONS};

fn name_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        4 => "[a-z]{1,6}",
        1 => proptest::sample::select(RESERVED_OPTIONS).prop_map(str::to_string),
    ]
}

fn value_strategy() -> impl Strategy<Value = OptionValue> {
    prop_oneof![
        any::<i64>().prop_map(OptionValue::Int),
        "[a-zA-Z0-9_./ ]{1,12}".prop_map(OptionValue::Text),
        any::<bool>().prop_map(OptionValue::from),
        Just(OptionValue::Unset),
    ]
}

proptest! {
    #[test]
    fn placeholders_always_match_arguments(
        entries in proptest::collection::vec((name_strategy(), value_strategy()), 0..12)
    ) {
        let options: OptionSet = entries.into_iter().collect();
        let line = CommandBuilder::new("/usr/bin/gmx", "mdrun")
            .options(&options)
            .build();

        prop_assert_eq!(line.placeholder_count(), line.args().len());

        let emitted = options
            .iter()
            .filter(|(name, value)| !RESERVED_OPTIONS.contains(name) && !value.is_unset())
            .count();
        let argv = line.argv().unwrap();
        prop_assert_eq!(argv.len(), 1 + 2 * emitted);
        prop_assert_eq!(argv[0].as_str(), "mdrun");
    }

    #[test]
    fn flag_order_follows_insertion_order(
        names in proptest::collection::vec("[a-z]{1,6}", 1..8)
    ) {
        let mut options = OptionSet::new();
        for (i, name) in names.iter().enumerate() {
            if !RESERVED_OPTIONS.contains(&name.as_str()) {
                options.set(name.as_str(), i as i64);
            }
        }
        let line = CommandBuilder::new("gmx", "grompp").options(&options).build();
        let argv = line.argv().unwrap();

        let flags: Vec<String> = argv.iter().skip(1).step_by(2).cloned().collect();
        let expected: Vec<String> = options
            .iter()
            .map(|(name, _)| format!("-{}", if name == "ntry" { "try" } else { name }))
            .collect();
        prop_assert_eq!(flags, expected);
    }
}
