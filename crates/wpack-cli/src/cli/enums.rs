use clap::ValueEnum;
use wpack_config::{EsTarget, Mode};

/// Build mode
#[derive(Copy, Clone, PartialEq, Eq, Debug, ValueEnum)]
pub enum ModeArg {
    /// Keeps console output and logs at info level
    #[value(name = "development")]
    Development,

    /// Drops console and debugger statements
    #[value(name = "production")]
    Production,
}

impl From<ModeArg> for Mode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Development => Mode::Development,
            ModeArg::Production => Mode::Production,
        }
    }
}

/// Syntax level of the emitted script
#[derive(Copy, Clone, PartialEq, Eq, Debug, ValueEnum)]
pub enum TargetArg {
    #[value(name = "es2015")]
    Es2015,
    #[value(name = "es2016")]
    Es2016,
    #[value(name = "es2017")]
    Es2017,
    #[value(name = "es2018")]
    Es2018,
    #[value(name = "es2019")]
    Es2019,
    #[value(name = "es2020")]
    Es2020,
    #[value(name = "es2021")]
    Es2021,
    #[value(name = "es2022")]
    Es2022,
    #[value(name = "es2023")]
    Es2023,
    #[value(name = "es2024")]
    Es2024,
    #[value(name = "esnext")]
    EsNext,
}

impl From<TargetArg> for EsTarget {
    fn from(target: TargetArg) -> Self {
        match target {
            TargetArg::Es2015 => EsTarget::ES2015,
            TargetArg::Es2016 => EsTarget::ES2016,
            TargetArg::Es2017 => EsTarget::ES2017,
            TargetArg::Es2018 => EsTarget::ES2018,
            TargetArg::Es2019 => EsTarget::ES2019,
            TargetArg::Es2020 => EsTarget::ES2020,
            TargetArg::Es2021 => EsTarget::ES2021,
            TargetArg::Es2022 => EsTarget::ES2022,
            TargetArg::Es2023 => EsTarget::ES2023,
            TargetArg::Es2024 => EsTarget::ES2024,
            TargetArg::EsNext => EsTarget::ESNext,
        }
    }
}
