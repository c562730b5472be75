//! Keyboard and touch screen collaborators
//!
//! The action handlers switch tabs with accelerators and swipe with touch
//! gestures. Both devices sit behind async traits so a backend or a test
//! double can provide them.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use crate::driver::{DriverError, Point};
use crate::engine::action::Action;

#[async_trait]
pub trait Keyboard: Send + Sync {
    /// Press and release an accelerator such as `"Ctrl+Tab"`
    async fn accel(&self, keys: &str) -> Result<(), DriverError>;
}

#[async_trait]
pub trait TouchScreen: Send + Sync {
    async fn tap(&self, point: Point) -> Result<(), DriverError>;

    async fn swipe(&self, from: Point, to: Point, duration: Duration) -> Result<(), DriverError>;
}

/// Action pressing `keys` once
pub fn accel_action(keyboard: Arc<dyn Keyboard>, keys: &str) -> Action {
    let keys: Arc<str> = keys.into();
    Action::new(move |ctx| {
        let keyboard = keyboard.clone();
        let keys = keys.clone();
        async move { ctx.guard(keyboard.accel(&keys)).await }
    })
}

pub fn swipe_action(touch: Arc<dyn TouchScreen>, from: Point, to: Point, duration: Duration) -> Action {
    Action::new(move |ctx| {
        let touch = touch.clone();
        async move { ctx.guard(touch.swipe(from, to, duration)).await }
    })
}

/// Keyboard that only records what it was asked to press
#[derive(Debug, Clone, Default)]
pub struct RecordingKeyboard {
    pressed: Arc<Mutex<Vec<String>>>,
}

impl RecordingKeyboard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pressed(&self) -> Vec<String> {
        self.pressed.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

#[async_trait]
impl Keyboard for RecordingKeyboard {
    async fn accel(&self, keys: &str) -> Result<(), DriverError> {
        self.pressed
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(keys.to_string());
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Gesture {
    Tap(Point),
    Swipe { from: Point, to: Point, duration: Duration },
}

/// Touch screen that records gestures
#[derive(Debug, Clone, Default)]
pub struct RecordingTouchScreen {
    gestures: Arc<Mutex<Vec<Gesture>>>,
}

impl RecordingTouchScreen {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn gestures(&self) -> Vec<Gesture> {
        self.gestures.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    fn push(&self, gesture: Gesture) {
        self.gestures
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(gesture);
    }
}

#[async_trait]
impl TouchScreen for RecordingTouchScreen {
    async fn tap(&self, point: Point) -> Result<(), DriverError> {
        self.push(Gesture::Tap(point));
        Ok(())
    }

    async fn swipe(&self, from: Point, to: Point, duration: Duration) -> Result<(), DriverError> {
        self.push(Gesture::Swipe { from, to, duration });
        Ok(())
    }
}
