// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Au-Zone Technologies

//! Mount targets and the video rendering surface
//!
//! The host application supplies a [`Document`] in which mount targets
//! ([`Container`]s) are looked up by id. A session mounts exactly one
//! [`VideoSurface`] into its container and feeds it the acquired stream;
//! decoders read frames through the surface, never from the stream directly,
//! so detaching the stream from the surface cuts every reader off at once.

use std::{
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc, Mutex,
    },
    thread,
    time::Duration,
};

use crate::{frame::Frame, lock, media::MediaStream};

/// An element of the host document that can hold the video surface
pub trait Container: Send + Sync {
    /// Remove every child node.
    fn clear(&self);

    fn append_child(&self, child_id: &str);

    /// Returns false when `child_id` was not a child.
    fn remove_child(&self, child_id: &str) -> bool;

    fn child_count(&self) -> usize;
}

/// The host document mount targets live in
pub trait Document: Send + Sync {
    fn get_element_by_id(&self, id: &str) -> Option<Arc<dyn Container>>;
}

/// Poll `document` for `id`, up to `attempts` lookups spaced by `interval`.
///
/// The first lookup happens immediately. Returns `None` once all attempts
/// are exhausted.
pub fn wait_for_container(
    document: &dyn Document,
    id: &str,
    attempts: u32,
    interval: Duration,
) -> Option<Arc<dyn Container>> {
    let mut count = 0;
    loop {
        if let Some(container) = document.get_element_by_id(id) {
            log::trace!("Container '{}' found after {} attempts", id, count + 1);
            return Some(container);
        }
        count += 1;
        if count >= attempts {
            return None;
        }
        thread::sleep(interval);
    }
}

/// Video sink mounted in a container
///
/// Plays inline, muted, scaled to fit without cropping so barcode edges
/// stay visible.
pub struct VideoSurface {
    id: String,
    stream: Mutex<Option<Arc<dyn MediaStream>>>,
    parent: Mutex<Option<Arc<dyn Container>>>,
    playing: AtomicBool,
}

impl VideoSurface {
    pub fn new(id: impl Into<String>) -> Arc<VideoSurface> {
        Arc::new(VideoSurface {
            id: id.into(),
            stream: Mutex::new(None),
            parent: Mutex::new(None),
            playing: AtomicBool::new(false),
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Empty `container` and mount the surface as its only child.
    pub fn mount(&self, container: Arc<dyn Container>) {
        container.clear();
        container.append_child(&self.id);
        *lock(&self.parent) = Some(container);
    }

    /// Set the stream as the surface source and start playback.
    pub fn attach_stream(&self, stream: Arc<dyn MediaStream>) {
        *lock(&self.stream) = Some(stream);
        self.playing.store(true, Ordering::SeqCst);
    }

    pub fn is_playing(&self) -> bool {
        self.playing.load(Ordering::SeqCst)
    }

    /// Grab the frame currently shown, if playback is running.
    pub fn frame(&self) -> Option<Frame> {
        let stream = lock(&self.stream);
        if !self.is_playing() {
            return None;
        }
        stream.as_ref().and_then(|s| s.latest_frame())
    }

    /// Dimensions of the current frame; `None` until the video has any.
    pub fn dimensions(&self) -> Option<(u32, u32)> {
        self.frame()
            .filter(Frame::has_dimensions)
            .map(|f| (f.width(), f.height()))
    }

    /// Stop playback and clear the source, returning the detached stream.
    pub fn detach_stream(&self) -> Option<Arc<dyn MediaStream>> {
        let mut stream = lock(&self.stream);
        self.playing.store(false, Ordering::SeqCst);
        stream.take()
    }

    /// Remove the surface from its container. Returns false if not mounted.
    pub fn unmount(&self) -> bool {
        match lock(&self.parent).take() {
            Some(parent) => parent.remove_child(&self.id),
            None => false,
        }
    }

    pub fn is_mounted(&self) -> bool {
        lock(&self.parent).is_some()
    }
}
