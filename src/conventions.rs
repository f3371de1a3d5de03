//! Column naming conventions of the RDB1 format.
//!
//! Timestamp reconstruction and numeric coercion are driven entirely by
//! column names. The conventions live here as one value so they can be
//! inspected, tested and versioned instead of being scattered through the
//! pipeline as string literals.

/// Naming conventions recognised by the importer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NamingConventions {
    /// Suffix of measurement columns subject to numeric coercion
    pub value_suffix: &'static str,
    /// Suffix of the date half of a date/time pair
    pub date_suffix: &'static str,
    /// Suffix of the time half of a date/time pair
    pub time_suffix: &'static str,
    /// Suffix of the merged timestamp column
    pub datetime_suffix: &'static str,
    /// Per-pair timezone code suffixes, in order of preference
    pub pair_tz_suffixes: &'static [&'static str],
    /// Timezone code column applying to every timestamp column
    pub shared_tz_column: &'static str,
    /// Suffix of the column preserving codes as originally reported
    pub reported_suffix: &'static str,
    /// Legacy layout column names
    pub legacy: LegacyLayout,
    /// Water-quality sample layout
    pub sample: SampleLayout,
}

/// Legacy DATE/TIME/TZCD layout
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LegacyLayout {
    pub date: &'static str,
    pub time: &'static str,
    pub tz: &'static str,
    pub merged: &'static str,
}

/// Sample start/end pairs sharing one timezone datum column
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SampleLayout {
    pub start_base: &'static str,
    pub end_base: &'static str,
    pub shared_tz_column: &'static str,
    /// Code column the end pair is normalized through; only its
    /// `_reported` copy is kept
    pub end_tz_column: &'static str,
    /// Name given to the merged start timestamp
    pub start_rename: &'static str,
}

/// Conventions used by the USGS RDB1 services
pub const RDB1_CONVENTIONS: NamingConventions = NamingConventions {
    value_suffix: "_va",
    date_suffix: "_dt",
    time_suffix: "_tm",
    datetime_suffix: "_dateTime",
    pair_tz_suffixes: &["_tz_cd", "_time_datum_cd"],
    shared_tz_column: "tz_cd",
    reported_suffix: "_reported",
    legacy: LegacyLayout {
        date: "DATE",
        time: "TIME",
        tz: "TZCD",
        merged: "DATETIME",
    },
    sample: SampleLayout {
        start_base: "sample",
        end_base: "sample_end",
        shared_tz_column: "sample_start_time_datum_cd",
        end_tz_column: "sample_end_time_datum_cd",
        start_rename: "startDateTime",
    },
};

impl Default for NamingConventions {
    fn default() -> Self {
        RDB1_CONVENTIONS
    }
}

impl NamingConventions {
    pub fn is_value_column(&self, name: &str) -> bool {
        name.ends_with(self.value_suffix)
    }

    /// Strip a trailing date or time suffix, returning the pair base
    pub fn pair_base<'a>(&self, name: &'a str) -> Option<&'a str> {
        name.strip_suffix(self.date_suffix)
            .or_else(|| name.strip_suffix(self.time_suffix))
    }

    pub fn date_column(&self, base: &str) -> String {
        format!("{base}{}", self.date_suffix)
    }

    pub fn time_column(&self, base: &str) -> String {
        format!("{base}{}", self.time_suffix)
    }

    pub fn datetime_column(&self, base: &str) -> String {
        format!("{base}{}", self.datetime_suffix)
    }

    /// Candidate per-pair timezone code columns, most preferred first
    pub fn pair_tz_columns(&self, base: &str) -> Vec<String> {
        self.pair_tz_suffixes
            .iter()
            .map(|suffix| format!("{base}{suffix}"))
            .collect()
    }

    pub fn reported_column(&self, tz_column: &str) -> String {
        format!("{tz_column}{}", self.reported_suffix)
    }

    /// Bases having both a date and a time column, in first-seen order
    pub fn pair_candidates<'a>(&self, names: &[&'a str]) -> Vec<&'a str> {
        let mut bases: Vec<&'a str> = Vec::new();
        for name in names {
            if let Some(base) = self.pair_base(name) {
                if !bases.contains(&base) {
                    bases.push(base);
                }
            }
        }
        bases
            .into_iter()
            .filter(|base| {
                names.contains(&self.date_column(base).as_str())
                    && names.contains(&self.time_column(base).as_str())
            })
            .collect()
    }

    /// Columns whose raw text feeds timestamp reconstruction or timezone
    /// lookup; these are never numerically inferred.
    pub fn is_temporal_part(&self, name: &str) -> bool {
        self.pair_base(name).is_some()
            || name == self.shared_tz_column
            || self.pair_tz_suffixes.iter().any(|s| name.ends_with(s))
            || name == self.legacy.date
            || name == self.legacy.time
            || name == self.legacy.tz
            || name == self.sample.shared_tz_column
    }
}
