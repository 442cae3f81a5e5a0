pub mod compile_time {
    pub mod parsing {
        /// Maximum number of items a single `begin_end_incr(...)` may produce
        /// RESOURCE: a typo in an end value must not exhaust memory
        pub const MAX_RANGE_ITEMS: usize = 100_000;

        /// Widest zero-padding a range may request
        /// RESOURCE: each padded item is allocated at this width
        pub const MAX_RANGE_PRECISION: usize = 64;

        /// Name of the range mini-language function
        pub const RANGE_FUNCTION: &str = "begin_end_incr";

        /// Sentinel accepted in place of a threshold comparison
        pub const THRESHOLD_NOT_APPLICABLE: &str = "NA";

        /// File extension that marks a python embedding script in a field name
        pub const PYTHON_SCRIPT_EXTENSION: &str = ".py";
    }

    pub mod namespace {
        /// Section the field engine reads from
        pub const DEFAULT_SECTION: &str = "config";

        /// Maximum depth of nested `{KEY}` references resolved by `get_string`
        /// SECURITY: prevents unbounded recursion on self-referencing keys
        pub const MAX_INTERPOLATION_DEPTH: usize = 20;

        /// Key listing the wrappers to run, e.g. `GridStat, PointStat(obs2)`
        pub const PROCESS_LIST_KEY: &str = "PROCESS_LIST";

        /// Key holding the comma-separated list of loaded config files
        pub const CONFIG_INPUT_KEY: &str = "CONFIG_INPUT";
    }

    pub mod validation {
        /// Maximum diagnostics kept in one validation report
        /// RESOURCE: keeps a badly broken config from flooding the terminal
        pub const MAX_REPORT_DIAGNOSTICS: usize = 1_000;
    }
}
