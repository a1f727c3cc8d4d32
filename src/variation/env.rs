//! Variations that only rewrite environment variables.
use super::{Entered, Variation};
use crate::context::BuildContext;
use crate::error::VariationError;
use std::ffi::OsStr;

pub const CAPTURE_ENVIRONMENT_VAR: &str = "CAPTURE_ENVIRONMENT";
pub const CAPTURE_ENVIRONMENT_VALUE: &str = "i_capture_the_environment";
pub const HOME_A: &str = "/nonexistent/first-build";
pub const HOME_B: &str = "/nonexistent/second-build";
pub const LOCALE_B: &str = "fr_CH.UTF-8";
pub const PATH_SUFFIX: &str = "/i_capture_the_path";
// POSIX TZ offsets, so they work without a zoneinfo database.
pub const TZ_A: &str = "GMT+12";
pub const TZ_B: &str = "GMT-14";

/// Sets a marker variable on B only, to catch builds that record the environment.
#[derive(Debug, Default)]
pub struct CapturesEnvironment;

impl Variation for CapturesEnvironment {
    fn name(&self) -> &'static str {
        "captures_environment"
    }

    fn enter(&self, mut context: BuildContext) -> Result<Entered, VariationError> {
        context
            .b
            .set_env(CAPTURE_ENVIRONMENT_VAR, CAPTURE_ENVIRONMENT_VALUE);
        Ok(Entered::pure(context))
    }
}

#[derive(Debug, Default)]
pub struct Home;

impl Variation for Home {
    fn name(&self) -> &'static str {
        "home"
    }

    fn enter(&self, mut context: BuildContext) -> Result<Entered, VariationError> {
        context.a.set_env("HOME", HOME_A);
        context.b.set_env("HOME", HOME_B);
        Ok(Entered::pure(context))
    }
}

#[derive(Debug, Default)]
pub struct Locales;

impl Variation for Locales {
    fn name(&self) -> &'static str {
        "locales"
    }

    fn enter(&self, mut context: BuildContext) -> Result<Entered, VariationError> {
        context.b.set_env("LANG", LOCALE_B);
        context.b.set_env("LC_ALL", LOCALE_B);
        Ok(Entered::pure(context))
    }
}

/// Appends a bogus entry to B's PATH, derived from A's PATH.
#[derive(Debug, Default)]
pub struct PathSuffix;

impl Variation for PathSuffix {
    fn name(&self) -> &'static str {
        "path"
    }

    fn enter(&self, mut context: BuildContext) -> Result<Entered, VariationError> {
        let base = context
            .a
            .env
            .get(OsStr::new("PATH"))
            .ok_or(VariationError::MissingEnv {
                variation: "path",
                var: "PATH",
            })?;
        let mut varied = base.clone();
        varied.push(PATH_SUFFIX);
        context.b.set_env("PATH", varied);
        Ok(Entered::pure(context))
    }
}

#[derive(Debug, Default)]
pub struct Timezone;

impl Variation for Timezone {
    fn name(&self) -> &'static str {
        "timezone"
    }

    fn enter(&self, mut context: BuildContext) -> Result<Entered, VariationError> {
        context.a.set_env("TZ", TZ_A);
        context.b.set_env("TZ", TZ_B);
        Ok(Entered::pure(context))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::variation::test_support::{sample_context, var};

    fn apply(variation: &dyn Variation) -> BuildContext {
        let entered = variation.enter(sample_context()).unwrap();
        assert!(entered.release.is_none());
        entered.context
    }

    #[test]
    fn captures_environment_marks_b_only() {
        let ctx = apply(&CapturesEnvironment);
        assert_eq!(
            var(&ctx.b.env, CAPTURE_ENVIRONMENT_VAR),
            Some(CAPTURE_ENVIRONMENT_VALUE)
        );
        assert_eq!(var(&ctx.a.env, CAPTURE_ENVIRONMENT_VAR), None);
    }

    #[test]
    fn home_differs_on_both_sides() {
        let ctx = apply(&Home);
        assert_eq!(var(&ctx.a.env, "HOME"), Some(HOME_A));
        assert_eq!(var(&ctx.b.env, "HOME"), Some(HOME_B));
    }

    #[test]
    fn locales_set_lang_and_lc_all_on_b() {
        let ctx = apply(&Locales);
        assert_eq!(var(&ctx.b.env, "LANG"), Some(LOCALE_B));
        assert_eq!(var(&ctx.b.env, "LC_ALL"), Some(LOCALE_B));
        assert_eq!(var(&ctx.a.env, "LANG"), None);
        assert_eq!(var(&ctx.a.env, "LC_ALL"), None);
    }

    #[test]
    fn path_suffix_extends_a_path_on_b() {
        let ctx = apply(&PathSuffix);
        assert_eq!(var(&ctx.a.env, "PATH"), Some("/usr/bin:/bin"));
        assert_eq!(var(&ctx.b.env, "PATH"), Some("/usr/bin:/bin/i_capture_the_path"));
    }

    #[cfg(unix)]
    #[test]
    fn path_suffix_keeps_non_utf8_bytes() {
        use std::ffi::OsString;
        use std::os::unix::ffi::OsStringExt;

        let mut ctx = sample_context();
        let raw = OsString::from_vec(b"/opt/caf\xe9/bin".to_vec());
        ctx.a.env.insert(OsString::from("PATH"), raw);
        let ctx = PathSuffix.enter(ctx).unwrap().context;
        assert_eq!(
            ctx.b.env[OsStr::new("PATH")].clone().into_vec(),
            b"/opt/caf\xe9/bin/i_capture_the_path".to_vec()
        );
    }

    #[test]
    fn path_suffix_requires_path_on_a() {
        let mut ctx = sample_context();
        ctx.a.env.remove(OsStr::new("PATH"));
        let err = PathSuffix.enter(ctx).err().unwrap();
        assert!(matches!(err, VariationError::MissingEnv { var: "PATH", .. }));
    }

    #[test]
    fn timezone_uses_opposite_offsets() {
        let ctx = apply(&Timezone);
        assert_eq!(var(&ctx.a.env, "TZ"), Some("GMT+12"));
        assert_eq!(var(&ctx.b.env, "TZ"), Some("GMT-14"));
    }

    #[test]
    fn env_variations_leave_commands_and_trees_alone() {
        let original = sample_context();
        for variation in [
            &CapturesEnvironment as &dyn Variation,
            &Home,
            &Locales,
            &PathSuffix,
            &Timezone,
        ] {
            let ctx = apply(variation);
            assert_eq!(ctx.a.command, original.a.command);
            assert_eq!(ctx.b.command, original.b.command);
            assert_eq!(ctx.a.tree, original.a.tree);
            assert_eq!(ctx.b.tree, original.b.tree);
        }
    }
}
