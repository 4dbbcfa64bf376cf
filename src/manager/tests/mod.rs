use super::test_helpers::{
    FakeBehavior, create_test_manager, create_test_manager_with, wait_for_downloading,
    wait_for_terminal,
};
use super::*;
use crate::error::TaskError;
use crate::types::{AudioFormat, TaskId, TaskStatus};
use std::time::Duration;

mod serve;
mod tasks;
