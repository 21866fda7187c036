//! Integration test: call-site rewriting over realistic C fixtures.

use centrinel_core::cgen::{HeaderOptions, SkipReason, render_header, rewrite_source};
use centrinel_core::{ShimConfig, SyncBuiltin, UpdateOp};
use centrinel_membrane::RegionId;

const REFCOUNT_FIXTURE: &str = r#"#include <stdlib.h>
#define INCREF(o) __sync_add_and_fetch(&(o)->refs, 1)

struct obj { int refs; };

/* __sync_fetch_and_sub(&o->refs, 1) in a comment stays */
static const char *msg = "__sync_lock_release(p)";

int decref(struct obj *o)
{
    if (__sync_sub_and_fetch(&o->refs,
                             1) == 0) {
        free(o);
        return 1;
    }
    return 0;
}

int claim(int *slot)
{
    return __sync_bool_compare_and_swap(slot, 0, 1);
}
"#;

fn enabled() -> ShimConfig {
    ShimConfig {
        normalize_atomics: true,
        ..ShimConfig::default()
    }
}

#[test]
fn comments_literals_and_directives_are_untouched() {
    let out = rewrite_source(REFCOUNT_FIXTURE, &enabled());
    assert!(out.text.contains("#define INCREF(o) __sync_add_and_fetch(&(o)->refs, 1)\n"));
    assert!(out.text.contains("/* __sync_fetch_and_sub(&o->refs, 1) in a comment stays */"));
    assert!(out.text.contains("\"__sync_lock_release(p)\""));
    assert_eq!(out.report.total_rewritten(), 2);
    assert_eq!(out.report.count(SyncBuiltin::OpAndFetch(UpdateOp::Sub)), 1);
    assert_eq!(out.report.count(SyncBuiltin::BoolCompareAndSwap), 1);
    assert!(out.report.skipped.is_empty());
}

#[test]
fn rewritten_calls_keep_line_numbers() {
    let out = rewrite_source(REFCOUNT_FIXTURE, &enabled());
    assert_eq!(out.text.lines().count(), REFCOUNT_FIXTURE.lines().count());
    for (original, rewritten) in REFCOUNT_FIXTURE.lines().zip(out.text.lines()) {
        if matches!(original.trim(), "free(o);" | "return 1;" | "return 0;") {
            assert_eq!(original, rewritten);
        }
    }
    assert!(out.text.contains("if ((*(&o->refs) -= (1))\n == 0) {"));
}

#[test]
fn nested_builtins_rewrite_inside_out() {
    let src = "r = __sync_fetch_and_add(__sync_lock_test_and_set(&pp, q), 1);";
    let out = rewrite_source(src, &enabled());
    assert_eq!(out.report.total_rewritten(), 2);
    assert!(!out.text.contains("__sync_"), "{}", out.text);
    // Inner site is numbered first; outer temporaries never shadow it.
    assert!(out.text.contains("__centrinel_ptr_0 = (&pp)"));
    assert!(out.text.contains("typeof((({ typeof((&pp)) __centrinel_ptr_0"));
    assert!(out.text.contains("__centrinel_tmp_1; })"));
}

#[test]
fn malformed_calls_are_reported_not_rewritten() {
    let src = "a();\n__sync_fetch_and_xor(p);\n__sync_bool_compare_and_swap(p, 1);\n";
    let out = rewrite_source(src, &enabled());
    assert_eq!(out.text, src);
    let lines: Vec<usize> = out.report.skipped.iter().map(|s| s.line).collect();
    assert_eq!(lines, vec![2, 3]);
}

const CONDITIONAL_FIXTURE: &str = r#"long bump(long *p)
{
    return __sync_fetch_and_add(p,
#ifdef BIG_STEP
                                100
#else
                                1
#endif
                                );
}

int take(int *lock)
{
    return __sync_lock_test_and_set(lock, 1);
}
"#;

#[test]
fn directives_inside_arguments_leave_the_site_for_the_compiler() {
    let out = rewrite_source(CONDITIONAL_FIXTURE, &enabled());
    let (guarded, rest) = CONDITIONAL_FIXTURE.split_at(CONDITIONAL_FIXTURE.find("int take").unwrap());
    assert!(out.text.starts_with(guarded));
    assert_eq!(out.text.lines().count(), CONDITIONAL_FIXTURE.lines().count());
    assert_ne!(&out.text[guarded.len()..], rest);

    assert_eq!(out.report.count(SyncBuiltin::LockTestAndSet), 1);
    assert_eq!(out.report.count(SyncBuiltin::FetchAndOp(UpdateOp::Add)), 0);
    assert_eq!(out.report.skipped.len(), 1);
    assert_eq!(out.report.skipped[0].line, 3);
    assert_eq!(out.report.skipped[0].reason, SkipReason::Directive { line: 4 });
}

#[test]
fn disabled_normalizer_passes_everything_through() {
    let config = ShimConfig {
        normalize_atomics: false,
        ..ShimConfig::default()
    };
    let out = rewrite_source(REFCOUNT_FIXTURE, &config);
    assert_eq!(out.text, REFCOUNT_FIXTURE);
    assert!(out.report.passthrough);
    assert_eq!(out.report.total_rewritten(), 0);
}

#[test]
fn header_and_rewriter_agree_on_expansion_shape() {
    let header = render_header(&HeaderOptions::from_config(&enabled()));
    let out = rewrite_source("__sync_val_compare_and_swap(ptr, oldval, newval)", &enabled());
    let from_header = header
        .lines()
        .find_map(|l| l.strip_prefix("#define __sync_val_compare_and_swap(ptr,oldval,newval,...) "))
        .expect("header defines val_compare_and_swap");
    assert_eq!(
        out.text
            .replace("__centrinel_ptr_0", "__centrinel_ptr")
            .replace("__centrinel_tmp_0", "__centrinel_tmp"),
        from_header
    );
}

#[test]
fn header_follows_configured_region() {
    let config = ShimConfig {
        managed_region: RegionId::new(7),
        ..enabled()
    };
    let header = render_header(&HeaderOptions::from_config(&config));
    assert!(header.contains("#define __CENTRINEL_MANAGED_REGION __region(7)"));
    assert!(header.contains("#define __CENTRINEL_HACK_SYNC_ATOMICS 1"));
}
