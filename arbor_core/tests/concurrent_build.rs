// Copyright 2026 the Arbor Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! First-use metadata builds racing across threads.

use std::sync::Barrier;
use std::sync::atomic::{AtomicUsize, Ordering};

use arbor_core::class::{BaseWidget, ClassMetadata, WidgetClass};
use arbor_core::descriptor::AttributeInitializer;
use arbor_core::error::{DescriptorError, ErrorKind};
use arbor_core::invalidation::InvalidationReason;

const THREADS: usize = 8;

static SLIDER_BUILDS: AtomicUsize = AtomicUsize::new(0);
static FAULTY_BUILDS: AtomicUsize = AtomicUsize::new(0);

struct Slider;

impl WidgetClass for Slider {
    const NAME: &'static str = "Slider";

    fn register_attributes(init: &mut AttributeInitializer<'_>) -> Result<(), DescriptorError> {
        SLIDER_BUILDS.fetch_add(1, Ordering::SeqCst);
        init.add_member_attribute("Value", InvalidationReason::PAINT, 0.0_f32)?;
        init.add_member_attribute("Step", InvalidationReason::LAYOUT, 1.0_f32)?
            .update_prerequisite("Value");
        Ok(())
    }
}

struct Faulty;

impl WidgetClass for Faulty {
    const NAME: &'static str = "Faulty";

    fn register_attributes(init: &mut AttributeInitializer<'_>) -> Result<(), DescriptorError> {
        FAULTY_BUILDS.fetch_add(1, Ordering::SeqCst);
        init.add_member_attribute("Children", InvalidationReason::CHILD_ORDER, 0_u32)?;
        Ok(())
    }
}

#[test]
fn racing_first_use_builds_once() {
    let barrier = Barrier::new(THREADS);
    let results: Vec<&'static ClassMetadata> = std::thread::scope(|s| {
        let handles: Vec<_> = (0..THREADS)
            .map(|_| {
                s.spawn(|| {
                    barrier.wait();
                    ClassMetadata::of::<Slider>().unwrap()
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    assert_eq!(SLIDER_BUILDS.load(Ordering::SeqCst), 1);
    let first = results[0];
    for other in &results[1..] {
        assert!(std::ptr::eq(first, *other), "every thread sees one instance");
    }
    assert!(first.is::<BaseWidget>());
    assert!(first.handle::<f32>("Step").is_ok());
}

#[test]
fn racing_failed_build_reports_same_error() {
    let barrier = Barrier::new(THREADS);
    let errors: Vec<DescriptorError> = std::thread::scope(|s| {
        let handles: Vec<_> = (0..THREADS)
            .map(|_| {
                s.spawn(|| {
                    barrier.wait();
                    ClassMetadata::of::<Faulty>().unwrap_err()
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    assert_eq!(FAULTY_BUILDS.load(Ordering::SeqCst), 1);
    for err in &errors {
        assert_eq!(err, &errors[0]);
        assert_eq!(err.kind(), ErrorKind::Configuration);
    }
    assert!(matches!(
        errors[0],
        DescriptorError::IllegalReason { class: "Faulty", .. }
    ));
}
