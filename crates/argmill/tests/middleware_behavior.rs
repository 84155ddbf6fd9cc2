//! End-to-end parser tests.
//!
//! Each test configures a [`Parser`] the way an application would and checks
//! what middleware, handlers and the failure sink observe for one or more
//! invocations.

use argmill::prelude::*;
use proptest::prelude::*;
use serde_json::json;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

type Failures = Arc<Mutex<Vec<(Option<String>, Option<String>)>>>;

/// A parser that never exits and records every failure.
fn recording_parser() -> (Parser, Failures) {
    let failures: Failures = Arc::default();
    let sink = failures.clone();
    let mut parser = Parser::new();
    parser
        .exit_process(false)
        .fail(move |message: Option<&str>, error: Option<&ArgmillError>| {
            sink.lock().unwrap().push((
                message.map(ToString::to_string),
                error.map(ToString::to_string),
            ));
        });
    (parser, failures)
}

fn counting(counter: &Arc<AtomicUsize>) -> Callback {
    let counter = counter.clone();
    Callback::new(move |_: &mut Arguments, _: &ParserContext| {
        counter.fetch_add(1, Ordering::SeqCst);
    })
}

fn setting(key: &'static str, value: &'static str) -> Callback {
    Callback::new(move |args: &mut Arguments, _: &ParserContext| {
        args.set(key, value);
    })
}

fn noop(_: &mut Arguments, _: &ParserContext) {}

#[test]
fn test_invalid_element_registers_nothing() {
    let (mut parser, _) = recording_parser();
    let err = parser
        .middleware(vec![
            setting("a", "a"),
            Callback::named("callback1"),
            setting("b", "b"),
        ])
        .unwrap_err();

    assert!(matches!(err, ArgmillError::InvalidMiddleware { position: 1, .. }));
    assert!(parser.global_middleware().is_empty());
}

#[test]
fn test_invalid_command_middleware_is_not_routed_to_sink() {
    let (mut parser, failures) = recording_parser();
    let result = parser.command(
        "broken",
        "",
        |scope| {
            scope.middleware(Callback::named("missing"))?;
            Ok(())
        },
        noop,
    );

    assert!(matches!(result, Err(ArgmillError::InvalidMiddleware { .. })));
    assert!(parser.find_command("broken").is_none());
    assert!(failures.lock().unwrap().is_empty());
}

#[test]
fn test_command_and_global_middleware_both_apply() {
    for global_first in [true, false] {
        let (mut parser, failures) = recording_parser();
        let seen = Arc::new(Mutex::new(None));
        let handler_seen = seen.clone();

        if global_first {
            parser.middleware(setting("mw1", "mw1")).unwrap();
        }
        parser
            .command(
                "mw",
                "adds middleware",
                |scope| {
                    scope.middleware(setting("mw2", "mw2"))?;
                    Ok(())
                },
                move |args: &mut Arguments, _: &ParserContext| {
                    *handler_seen.lock().unwrap() = Some(args.to_json());
                },
            )
            .unwrap();
        if !global_first {
            parser.middleware(setting("mw1", "mw1")).unwrap();
        }

        parser.parse(["mw"]).unwrap();

        let seen = seen.lock().unwrap().clone().unwrap();
        assert_eq!(seen["mw1"], json!("mw1"), "global_first = {global_first}");
        assert_eq!(seen["mw2"], json!("mw2"), "global_first = {global_first}");
        assert!(failures.lock().unwrap().is_empty());
    }
}

#[test]
fn test_sibling_commands_are_isolated() {
    let (mut parser, _) = recording_parser();
    let counter = Arc::new(AtomicUsize::new(0));

    parser
        .middleware(counting(&counter))
        .unwrap()
        .command(
            "foo",
            "",
            |scope| {
                scope.middleware(counting(&counter))?;
                Ok(())
            },
            noop,
        )
        .unwrap()
        .command(
            "bar",
            "",
            |scope| {
                scope.middleware(counting(&counter))?;
                Ok(())
            },
            noop,
        )
        .unwrap();

    parser.parse(["foo"]).unwrap();
    assert_eq!(counter.swap(0, Ordering::SeqCst), 2);

    parser.parse(["bar"]).unwrap();
    assert_eq!(counter.load(Ordering::SeqCst), 2);

    assert_eq!(parser.find_command("bar").unwrap().middleware().len(), 1);
    assert_eq!(parser.global_middleware().len(), 1);
}

#[test]
fn test_declared_list_runs_after_builder_middleware() {
    let (mut parser, _) = recording_parser();
    let order = Arc::new(Mutex::new(Vec::new()));
    let record = |label: &'static str| {
        let order = order.clone();
        Callback::new(move |_: &mut Arguments, _: &ParserContext| {
            order.lock().unwrap().push(label);
        })
    };

    parser
        .command_with_middleware(
            "run",
            "",
            |scope| {
                scope.middleware(record("builder"))?;
                Ok(())
            },
            noop,
            vec![record("declared-1"), record("declared-2")],
        )
        .unwrap();

    parser.parse(["run"]).unwrap();
    assert_eq!(
        *order.lock().unwrap(),
        vec!["builder", "declared-1", "declared-2"]
    );
}

#[tokio::test]
async fn test_async_parent_middleware_runs_once_for_grandchild() {
    let (mut parser, failures) = recording_parser();
    let counter = Arc::new(AtomicUsize::new(0));
    let handled = Arc::new(AtomicUsize::new(0));

    let parent_counter = counter.clone();
    let leaf_handled = handled.clone();
    parser
        .command(
            "remote",
            "",
            move |remote| {
                remote
                    .middleware(Callback::new(move |_: &mut Arguments, _: &ParserContext| {
                        let counter = parent_counter.clone();
                        MiddlewareOutcome::deferred(async move {
                            tokio::time::sleep(Duration::from_millis(5)).await;
                            counter.fetch_add(1, Ordering::SeqCst);
                            Ok::<_, anyhow::Error>(())
                        })
                    }))?
                    .command(
                        "branch",
                        "",
                        move |branch| {
                            branch.command(
                                "rename <from> <to>",
                                "",
                                |_| Ok(()),
                                move |_: &mut Arguments, _: &ParserContext| {
                                    leaf_handled.fetch_add(1, Ordering::SeqCst);
                                },
                            )?;
                            Ok(())
                        },
                        noop,
                    )?;
                Ok(())
            },
            noop,
        )
        .unwrap();

    let resolution = parser
        .parse(["remote", "branch", "rename", "old", "new"])
        .unwrap();
    assert!(resolution.is_deferred());

    let args = resolution.resolve().await.unwrap();
    assert_eq!(args.get_str("from"), Some("old"));
    assert_eq!(args.get_str("to"), Some("new"));
    assert_eq!(counter.load(Ordering::SeqCst), 1);
    assert_eq!(handled.load(Ordering::SeqCst), 1);
    assert!(failures.lock().unwrap().is_empty());
}

#[test]
fn test_deferred_before_validation_is_a_synchrony_violation() {
    let (mut parser, failures) = recording_parser();
    let handled = Arc::new(AtomicUsize::new(0));
    let handler_count = handled.clone();

    parser
        .middleware_before_validation(Callback::new(|_: &mut Arguments, _: &ParserContext| {
            MiddlewareOutcome::deferred(async { Ok::<_, anyhow::Error>(()) })
        }))
        .unwrap()
        .command("sync", "", |_| Ok(()), move |_: &mut Arguments, _: &ParserContext| {
            handler_count.fetch_add(1, Ordering::SeqCst);
        })
        .unwrap();

    let err = parser.parse(["sync"]).unwrap_err();

    assert!(matches!(err, ArgmillError::SynchronyViolation { .. }));
    assert_eq!(handled.load(Ordering::SeqCst), 0);

    let failures = failures.lock().unwrap();
    assert_eq!(failures.len(), 1);
    assert!(failures[0].0.is_none());
    assert_eq!(failures[0].1.as_deref(), Some(err.to_string().as_str()));
}

#[tokio::test]
async fn test_rejected_middleware_reaches_sink_and_skips_handler() {
    let (mut parser, failures) = recording_parser();
    let handled = Arc::new(AtomicUsize::new(0));
    let handler_count = handled.clone();

    parser
        .middleware(Callback::new(|_: &mut Arguments, _: &ParserContext| {
            MiddlewareOutcome::deferred(async {
                Err::<(), _>(anyhow::anyhow!("remote unreachable"))
            })
        }))
        .unwrap()
        .command("fetch", "", |_| Ok(()), move |_: &mut Arguments, _: &ParserContext| {
            handler_count.fetch_add(1, Ordering::SeqCst);
        })
        .unwrap();

    let resolution = parser.parse(["fetch"]).unwrap();
    assert!(failures.lock().unwrap().is_empty());

    let err = resolution.resolve().await.unwrap_err();
    assert!(matches!(err, ArgmillError::Application(_)));
    assert_eq!(handled.load(Ordering::SeqCst), 0);
    assert_eq!(
        *failures.lock().unwrap(),
        vec![(None, Some("remote unreachable".to_string()))]
    );
}

#[test]
fn test_handler_error_reaches_sink() {
    let (mut parser, failures) = recording_parser();
    parser
        .command("explode", "", |_| Ok(()), |_: &mut Arguments, _: &ParserContext| {
            Err::<(), _>(anyhow::anyhow!("handler failed"))
        })
        .unwrap();

    let err = parser.parse(["explode"]).unwrap_err();
    assert!(err.as_application().is_some());
    assert_eq!(
        *failures.lock().unwrap(),
        vec![(None, Some("handler failed".to_string()))]
    );
}

#[test]
fn test_validation_failure_sends_message_only() {
    let (mut parser, failures) = recording_parser();
    let post = Arc::new(AtomicUsize::new(0));

    parser
        .demand("mw")
        .middleware(counting(&post))
        .unwrap();

    let err = parser.parse(["--other", "1"]).unwrap_err();
    assert_eq!(err.usage_message(), Some("Missing required argument: mw"));
    assert_eq!(post.load(Ordering::SeqCst), 0);
    assert_eq!(
        *failures.lock().unwrap(),
        vec![(Some("Missing required argument: mw".to_string()), None)]
    );
}

#[test]
fn test_before_validation_middleware_satisfies_demand() {
    let (mut parser, failures) = recording_parser();
    parser
        .demand("mw")
        .middleware_before_validation(setting("mw", "filled"))
        .unwrap();

    let args = parser.parse(Vec::<String>::new()).unwrap().into_resolved().unwrap();
    assert_eq!(args.get_str("mw"), Some("filled"));
    assert!(failures.lock().unwrap().is_empty());
}

#[test]
fn test_missing_required_placeholder_is_a_validation_error() {
    let (mut parser, failures) = recording_parser();
    parser.command("clone <repo>", "", |_| Ok(()), noop).unwrap();

    parser.parse(["clone"]).unwrap_err();
    assert_eq!(
        *failures.lock().unwrap(),
        vec![(Some("Missing required argument: repo".to_string()), None)]
    );
}

#[test]
fn test_aliases_visible_to_first_middleware() {
    let (mut parser, _) = recording_parser();
    let seen = Arc::new(Mutex::new(Vec::new()));
    let first = seen.clone();

    parser
        .alias("foo", "f")
        .middleware_before_validation(Callback::new(move |args: &mut Arguments, _: &ParserContext| {
            first
                .lock()
                .unwrap()
                .push((args.get_i64("foo"), args.get_i64("f")));
        }))
        .unwrap();

    parser.parse(["-f", "99"]).unwrap();
    parser.parse(["--foo", "7"]).unwrap();

    assert_eq!(
        *seen.lock().unwrap(),
        vec![(Some(99), Some(99)), (Some(7), Some(7))]
    );
}

#[test]
fn test_command_alias_and_scoped_option_alias() {
    let (mut parser, _) = recording_parser();
    parser
        .command(
            "checkout <branch>",
            "",
            |scope| {
                scope.command_alias("co").alias("force", "F");
                Ok(())
            },
            noop,
        )
        .unwrap();

    let args = parser
        .parse(["co", "main", "-F"])
        .unwrap()
        .into_resolved()
        .unwrap();
    assert_eq!(args.get_str("branch"), Some("main"));
    assert_eq!(args.get_bool("force"), Some(true));

    let args = parser.parse(["-F"]).unwrap().into_resolved().unwrap();
    assert_eq!(args.get("force"), None);
}

#[test]
fn test_middleware_receives_parser_context() {
    let (mut parser, _) = recording_parser();
    let seen = Arc::new(Mutex::new(None));
    let observed = seen.clone();

    parser
        .middleware(Callback::new(move |_: &mut Arguments, ctx: &ParserContext| {
            *observed.lock().unwrap() = Some((
                ctx.command_path().to_vec(),
                ctx.has_command("remote"),
                ctx.is_demanded("name"),
            ));
        }))
        .unwrap()
        .command(
            "remote",
            "",
            |remote| {
                remote.command("add <name>", "", |_| Ok(()), noop)?;
                Ok(())
            },
            noop,
        )
        .unwrap();

    parser.parse(["remote", "add", "origin"]).unwrap();
    assert_eq!(
        seen.lock().unwrap().clone(),
        Some((vec!["remote".to_string(), "add".to_string()], true, true))
    );
}

#[test]
fn test_repeated_callback_runs_once_per_registration() {
    let (mut parser, _) = recording_parser();
    let counter = Arc::new(AtomicUsize::new(0));
    let shared = counting(&counter);

    parser
        .middleware(vec![shared.clone(), shared.clone()])
        .unwrap()
        .command(
            "twice",
            "",
            |scope| {
                scope.middleware(shared)?;
                Ok(())
            },
            noop,
        )
        .unwrap();

    assert_eq!(parser.global_middleware().len(), 2);

    parser.parse(Vec::<String>::new()).unwrap();
    assert_eq!(counter.swap(0, Ordering::SeqCst), 2);

    parser.parse(["twice"]).unwrap();
    assert_eq!(counter.load(Ordering::SeqCst), 3);
}

#[test]
fn test_callback_registered_before_and_after_validation_runs_in_both() {
    let (mut parser, _) = recording_parser();
    let runs = Arc::new(Mutex::new(Vec::new()));
    let seen = runs.clone();
    let log = Callback::new(move |args: &mut Arguments, _: &ParserContext| {
        seen.lock().unwrap().push(args.contains_key("validated"));
    });

    parser
        .middleware_before_validation(log.clone())
        .unwrap()
        .middleware(setting("validated", "yes"))
        .unwrap()
        .middleware(log)
        .unwrap();

    parser.parse(Vec::<String>::new()).unwrap();
    assert_eq!(*runs.lock().unwrap(), vec![false, true]);
}

#[tokio::test]
async fn test_deferred_handler_result_is_awaitable() {
    let (mut parser, _) = recording_parser();
    parser
        .command("slow", "", |_| Ok(()), |_: &mut Arguments, _: &ParserContext| {
            MiddlewareOutcome::deferred(async {
                tokio::time::sleep(Duration::from_millis(5)).await;
                Ok::<_, anyhow::Error>([("done", true)].into_iter().collect::<Arguments>())
            })
        })
        .unwrap();

    let args = parser.parse_async(["slow"]).await.unwrap();
    assert_eq!(args.get_bool("done"), Some(true));
}

proptest! {
    #[test]
    fn prop_sync_middleware_apply_in_registration_order(n in 1usize..16) {
        let (mut parser, _) = recording_parser();
        for i in 0..n {
            parser
                .middleware(Callback::new(move |args: &mut Arguments, _: &ParserContext| {
                    args.append("order", json!(i));
                    args.set("last", i as u64);
                }))
                .unwrap();
        }

        let args = parser
            .parse(Vec::<String>::new())
            .unwrap()
            .into_resolved()
            .unwrap();

        let expected: Vec<serde_json::Value> = (0..n).map(|i| json!(i)).collect();
        let order = match args.get("order") {
            Some(serde_json::Value::Array(items)) => items.clone(),
            Some(single) => vec![single.clone()],
            None => Vec::new(),
        };
        prop_assert_eq!(order, expected);
        prop_assert_eq!(args.get_i64("last"), Some((n - 1) as i64));
    }
}
