use flowline::{
    ConfigurationContext, EngineError, Envelope, ExecutionChain, FaultCode, Flow, Header,
    HeaderBlock, InvocationResponse, MessageContext, SoapVersion,
    testing::{Journal, JournalEntry, ScriptedHandler},
};

mod common;
use common::{
    HeaderProcessor, TruncateRest, chain_of, completed, engine, init_tracing, invoked, names,
    recording_exchange,
};

#[tokio::test]
async fn test_receive_runs_chain_in_order_then_delivers() {
    init_tracing();
    let journal = Journal::new();
    let engine = engine(
        ConfigurationContext::builder()
            .in_chain(chain_of(&journal, &["transport", "addressing", "dispatch"]))
            .build(),
    );
    let mut ctx = MessageContext::new("urn:uuid:1")
        .with_server_side(true)
        .with_operation_context(recording_exchange(&journal, "echo"));

    let response = engine.receive(&mut ctx).await.unwrap();

    assert_eq!(response, InvocationResponse::Continue);
    assert_eq!(
        journal.entries(),
        vec![
            invoked("transport"),
            invoked("addressing"),
            invoked("dispatch"),
            JournalEntry::Received("urn:uuid:1".into()),
            completed("transport"),
            completed("addressing"),
            completed("dispatch"),
        ]
    );
    assert!(ctx.inbound_executed().is_empty());
    assert!(!ctx.is_paused());
}

#[tokio::test]
async fn test_suspend_on_last_handler_then_resume_delivers_once() {
    init_tracing();
    let journal = Journal::new();
    let chain = ExecutionChain::builder()
        .handler(ScriptedHandler::new("h0", &journal))
        .handler(ScriptedHandler::new("h1", &journal))
        .handler(ScriptedHandler::suspend_once("h2", &journal))
        .build();
    let engine = engine(ConfigurationContext::builder().in_chain(chain).build());
    let mut ctx = MessageContext::new("m1")
        .with_server_side(true)
        .with_operation_context(recording_exchange(&journal, "echo"));

    let response = engine.receive(&mut ctx).await.unwrap();

    assert_eq!(response, InvocationResponse::Suspend);
    assert!(ctx.is_paused());
    assert_eq!(ctx.current_handler_index(), Some(2));
    assert_eq!(names(ctx.inbound_executed()), vec!["h0", "h1", "h2"]);
    assert!(journal.received().is_empty());
    assert!(journal.completed().is_empty());

    journal.clear();
    // The context can be resumed from a different task.
    let resumed = tokio::spawn(async move {
        let response = engine.resume(&mut ctx).await;
        (response, ctx)
    });
    let (response, ctx) = resumed.await.unwrap();

    assert_eq!(response.unwrap(), InvocationResponse::Continue);
    assert!(!ctx.is_paused());
    assert_eq!(
        journal.entries(),
        vec![
            invoked("h2"),
            JournalEntry::Received("m1".into()),
            completed("h0"),
            completed("h1"),
            completed("h2"),
        ]
    );
    assert!(ctx.inbound_executed().is_empty());
}

#[tokio::test]
async fn test_failure_on_first_handler_completes_nobody() {
    let journal = Journal::new();
    let chain = ExecutionChain::builder()
        .handler(ScriptedHandler::failing("h0", &journal, "malformed"))
        .handler(ScriptedHandler::new("h1", &journal))
        .build();
    let engine = engine(ConfigurationContext::builder().in_chain(chain).build());
    let mut ctx = MessageContext::new("m1");

    let err = engine.receive(&mut ctx).await.unwrap_err();

    assert!(matches!(err, EngineError::Handler { ref handler, .. } if handler == "h0"));
    assert!(journal.completed().is_empty());
    assert!(ctx.inbound_executed().is_empty());
}

#[tokio::test]
async fn test_failure_later_completes_handlers_up_to_failing_one() {
    let journal = Journal::new();
    let chain = ExecutionChain::builder()
        .handler(ScriptedHandler::new("h0", &journal))
        .handler(ScriptedHandler::failing("h1", &journal, "bad token"))
        .handler(ScriptedHandler::new("h2", &journal))
        .build();
    let engine = engine(ConfigurationContext::builder().in_chain(chain).build());
    let mut ctx = MessageContext::new("m1")
        .with_server_side(true)
        .with_operation_context(recording_exchange(&journal, "echo"));

    let err = engine.receive(&mut ctx).await.unwrap_err();

    assert!(!err.is_fault());
    assert_eq!(journal.invoked(), vec!["h0", "h1"]);
    assert_eq!(journal.completed(), vec!["h0", "h1"]);
    assert!(journal.received().is_empty());
}

#[tokio::test]
async fn test_abort_completes_without_delivery() {
    let journal = Journal::new();
    let chain = ExecutionChain::builder()
        .handler(ScriptedHandler::new("h0", &journal))
        .handler(ScriptedHandler::responding(
            "h1",
            &journal,
            InvocationResponse::Abort,
        ))
        .handler(ScriptedHandler::new("h2", &journal))
        .build();
    let engine = engine(ConfigurationContext::builder().in_chain(chain).build());
    let mut ctx = MessageContext::new("m1")
        .with_server_side(true)
        .with_operation_context(recording_exchange(&journal, "echo"));

    let response = engine.receive(&mut ctx).await.unwrap();

    assert_eq!(response, InvocationResponse::Abort);
    assert!(journal.received().is_empty());
    assert_eq!(journal.completed(), vec!["h0", "h1"]);
}

#[tokio::test]
async fn test_unprocessed_mandatory_header_faults_after_completion() {
    let journal = Journal::new();
    let engine = engine(
        ConfigurationContext::builder()
            .in_chain(chain_of(&journal, &["h0"]))
            .build(),
    );
    let header = Header::new().with_block(
        HeaderBlock::new("app:Ticket")
            .with_role("urn:example:application-specific")
            .with_must_understand(true),
    );
    let mut ctx = MessageContext::new("m1")
        .with_server_side(true)
        .with_envelope(Envelope::new(SoapVersion::Soap12).with_header(header))
        .with_operation_context(recording_exchange(&journal, "echo"));

    let err = engine.receive(&mut ctx).await.unwrap_err();

    let fault = err.fault().unwrap();
    assert_eq!(fault.code, FaultCode::MustUnderstand);
    assert_eq!(fault.qualified_code(), "soapenv:MustUnderstand");
    assert_eq!(fault.header, "app:Ticket");
    assert!(journal.received().is_empty());
    assert_eq!(journal.completed(), vec!["h0"]);
}

#[tokio::test]
async fn test_header_processed_by_chain_passes_must_understand() {
    let journal = Journal::new();
    let chain = ExecutionChain::builder()
        .handler(HeaderProcessor {
            header: "app:Ticket",
        })
        .build();
    let engine = engine(ConfigurationContext::builder().in_chain(chain).build());
    let header = Header::new().with_block(
        HeaderBlock::new("app:Ticket")
            .with_role("urn:example:application-specific")
            .with_must_understand(true),
    );
    let mut ctx = MessageContext::new("m1")
        .with_server_side(true)
        .with_envelope(Envelope::new(SoapVersion::Soap12).with_header(header))
        .with_operation_context(recording_exchange(&journal, "echo"));

    let response = engine.receive(&mut ctx).await.unwrap();

    assert_eq!(response, InvocationResponse::Continue);
    assert_eq!(journal.received(), vec!["m1"]);
}

#[tokio::test]
async fn test_chain_changes_stay_with_their_message() {
    let journal = Journal::new();
    let chain = ExecutionChain::builder()
        .handler(TruncateRest)
        .handler(ScriptedHandler::new("after", &journal))
        .build();
    let engine = engine(ConfigurationContext::builder().in_chain(chain).build());

    let mut first = MessageContext::new("m1");
    engine.receive(&mut first).await.unwrap();
    assert_eq!(names(first.execution_chain()), vec!["truncate-rest"]);
    assert!(journal.invoked().is_empty());

    // The template still holds both handlers.
    assert_eq!(
        engine.configuration().global_in_chain().names(),
        vec!["truncate-rest", "after"]
    );
}

#[tokio::test]
async fn test_receive_fault_uses_fault_chain_and_resumes_inbound() {
    init_tracing();
    let journal = Journal::new();
    let fault_chain = ExecutionChain::builder()
        .handler(ScriptedHandler::suspend_once("fault-h0", &journal))
        .build();
    let engine = engine(
        ConfigurationContext::builder()
            .in_chain(chain_of(&journal, &["in-h0"]))
            .in_fault_chain(fault_chain)
            .build(),
    );
    let mut ctx = MessageContext::new("f1");

    let response = engine.receive_fault(&mut ctx).await.unwrap();
    assert_eq!(response, InvocationResponse::Suspend);
    assert_eq!(ctx.flow(), Flow::InFault);

    let response = engine.resume(&mut ctx).await.unwrap();

    assert_eq!(response, InvocationResponse::Continue);
    assert_eq!(journal.invoked(), vec!["fault-h0", "fault-h0"]);
    assert_eq!(journal.completed(), vec!["fault-h0"]);
    assert!(ctx.outbound_executed().is_empty());
}

#[tokio::test]
async fn test_messages_run_concurrently_on_one_engine() {
    let journal = Journal::new();
    let engine = engine(
        ConfigurationContext::builder()
            .in_chain(chain_of(&journal, &["h0", "h1"]))
            .build(),
    );

    let runs = (0..8).map(|i| {
        let engine = engine.clone();
        async move {
            let mut ctx = MessageContext::new(format!("m{i}"));
            engine.receive(&mut ctx).await
        }
    });
    let results = futures::future::join_all(runs).await;

    assert!(
        results
            .iter()
            .all(|r| matches!(r, Ok(InvocationResponse::Continue)))
    );
    assert_eq!(journal.invoked().len(), 16);
    assert_eq!(journal.completed().len(), 16);
}
