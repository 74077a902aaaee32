// Copyright (c) James Kassemi, SC, US. All rights reserved.

//! Client for the pika-blast API plus the remote console mirror.

pub mod client;
pub mod mirror;

pub use client::{BlastClient, ClientError};
pub use mirror::{
    spawn as spawn_mirror, ConsoleSink, LogSink, LogTransport, MirrorHandle, MirrorOptions,
    RemoteLogSink,
};
