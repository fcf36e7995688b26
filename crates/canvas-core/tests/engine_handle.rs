// File: crates/canvas-core/tests/engine_handle.rs
// Purpose: Single-flight engine loading, waiter notification, failure, and the shared resource cache.

mod common;

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use canvas_core::{CanvasState, EngineError, EngineHandle, EngineStatus, ResourceCache};
use common::{opts, FakeEngine, Rig};

#[test]
fn concurrent_requests_share_one_load() {
    let handle: EngineHandle<u32> = EngineHandle::new();
    let notified = Rc::new(RefCell::new(Vec::new()));

    let n1 = notified.clone();
    let ticket = handle.request(move |r| n1.borrow_mut().push(r.map(|e| *e))).expect("first request loads");
    assert_eq!(handle.status(), EngineStatus::Loading);

    let n2 = notified.clone();
    assert!(handle.request(move |r| n2.borrow_mut().push(r.map(|e| *e))).is_none());
    let n3 = notified.clone();
    handle.on_ready(move |r| n3.borrow_mut().push(r.map(|e| *e)));
    assert!(notified.borrow().is_empty());

    ticket.complete(Ok(42));
    assert_eq!(handle.status(), EngineStatus::Ready);
    assert_eq!(*notified.borrow(), vec![Ok(42), Ok(42), Ok(42)]);

    // Late requesters are answered immediately.
    let n4 = notified.clone();
    assert!(handle.request(move |r| n4.borrow_mut().push(r.map(|e| *e))).is_none());
    assert_eq!(notified.borrow().len(), 4);
}

#[test]
fn clones_observe_the_same_engine() {
    let a: EngineHandle<String> = EngineHandle::new();
    let b = a.clone();
    let engine = a.load_with(|| Ok("skia".to_string())).unwrap();
    assert!(Rc::ptr_eq(&engine, &b.get().unwrap()));
}

#[test]
fn load_with_runs_the_loader_once() {
    let handle: EngineHandle<u8> = EngineHandle::new();
    let runs = Cell::new(0);
    for _ in 0..3 {
        let v = handle
            .load_with(|| {
                runs.set(runs.get() + 1);
                Ok(1)
            })
            .unwrap();
        assert_eq!(*v, 1);
    }
    assert_eq!(runs.get(), 1);
}

#[test]
fn abandoned_ticket_fails_every_waiter() {
    let handle: EngineHandle<u8> = EngineHandle::new();
    let got = Rc::new(RefCell::new(None));
    let g = got.clone();
    let ticket = handle.request(move |r| *g.borrow_mut() = Some(r.map(|e| *e)));
    drop(ticket);
    assert_eq!(handle.status(), EngineStatus::Failed);
    assert!(matches!(*got.borrow(), Some(Err(EngineError::Load(_)))));
    assert!(handle.error().is_some());
}

#[test]
fn failed_load_can_be_retried_after_reset() {
    let handle: EngineHandle<u8> = EngineHandle::new();
    let err = handle.load_with(|| Err(EngineError::Load("no fonts".into()))).unwrap_err();
    assert_eq!(err, EngineError::Load("no fonts".into()));
    // Still failed: the loader is not run again.
    assert!(handle.load_with(|| Ok(3)).is_err());

    handle.reset_failed();
    assert_eq!(handle.status(), EngineStatus::Uninitialized);
    assert_eq!(*handle.load_with(|| Ok(3)).unwrap(), 3);
}

#[test]
fn mount_on_failed_engine_is_not_ready() {
    let handle = EngineHandle::new();
    let _ = handle.load_with(|| Err::<FakeEngine, _>(EngineError::Unsupported("gl".into())));
    let rig = Rig::with_handle(handle, opts(10.0, 10.0, false));
    assert!(rig.manager.mount().unwrap_err().is_not_ready());
    assert_eq!(rig.manager.state(), CanvasState::Unbound);
}

#[test]
fn deferred_mount_survives_a_failed_load_and_retry() {
    let handle = EngineHandle::new();
    let rig = Rig::with_handle(handle.clone(), opts(64.0, 32.0, true));

    let ticket = handle.request(|_| {}).unwrap();
    assert!(rig.manager.mount().is_err());
    ticket.complete(Err(EngineError::Load("boom".into())));
    assert_eq!(rig.manager.state(), CanvasState::Unbound);

    handle.reset_failed();
    let ticket = handle.request(|_| {}).unwrap();
    assert!(rig.manager.mount().is_err());
    ticket.complete(Ok(FakeEngine::hardware_ok()));
    assert_eq!(rig.manager.state(), CanvasState::Looping);
    assert_eq!(rig.rec.calls(), 1);
}

#[test]
fn many_surfaces_share_one_engine() {
    let handle = EngineHandle::ready(FakeEngine::hardware_ok());
    let a = Rig::with_handle(handle.clone(), opts(10.0, 10.0, false));
    let b = Rig::with_handle(handle.clone(), opts(20.0, 20.0, false));
    a.manager.mount().unwrap();
    b.manager.mount().unwrap();
    let engine = handle.get().unwrap();
    assert_eq!(engine.live.get(), 2);
    a.manager.teardown();
    assert_eq!(engine.live.get(), 1);
    assert_eq!(b.manager.state(), CanvasState::Ready);
}

#[test]
fn cache_populates_each_key_once() {
    let cache: ResourceCache<String, Vec<u8>> = ResourceCache::new();
    let loads = Cell::new(0);
    let load = |bytes: &[u8]| {
        loads.set(loads.get() + 1);
        bytes.to_vec()
    };
    let a = cache.get_or_populate("Roboto".into(), || load(b"ttf"));
    let b = cache.get_or_populate("Roboto".into(), || load(b"other"));
    assert!(Rc::ptr_eq(&a, &b));
    assert_eq!(*b, b"ttf".to_vec());
    assert_eq!(loads.get(), 1);
    assert_eq!(cache.len(), 1);
}
