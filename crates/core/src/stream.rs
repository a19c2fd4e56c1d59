//! Stream combinators used to derive screen state.
//!
//! Everything here works on `'static` boxed streams so that pipelines can be
//! assembled from trait objects and moved into spawned tasks.

use std::pin::Pin;
use std::task::{Context, Poll};

use futures_core::Stream;
use futures_util::future::{self, Either};
use futures_util::stream::{self, BoxStream, StreamExt};
use pin_project::pin_project;
use tokio::sync::watch;

/// Latest-wins flat map.
///
/// Every item of the outer stream is mapped to an inner stream, and the
/// previous inner stream is dropped as soon as a newer outer item arrives.
/// Work still in flight inside a superseded inner stream is cancelled with
/// it, so its output can never be observed after the newer value.
///
/// The outer stream is always drained before the inner stream is polled.
/// The combined stream ends once the outer stream has ended and the current
/// inner stream has ended too.
#[pin_project]
#[must_use = "streams do nothing unless polled"]
pub struct SwitchMap<S, F, U> {
    #[pin]
    outer: S,
    #[pin]
    inner: Option<U>,
    f: F,
    outer_done: bool,
}

impl<S, F, U> Stream for SwitchMap<S, F, U>
where
    S: Stream,
    F: FnMut(S::Item) -> U,
    U: Stream,
{
    type Item = U::Item;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let mut this = self.project();

        while !*this.outer_done {
            match this.outer.as_mut().poll_next(cx) {
                Poll::Ready(Some(item)) => this.inner.set(Some((this.f)(item))),
                Poll::Ready(None) => *this.outer_done = true,
                Poll::Pending => break,
            }
        }

        if let Some(inner) = this.inner.as_mut().as_pin_mut() {
            match inner.poll_next(cx) {
                Poll::Ready(Some(item)) => return Poll::Ready(Some(item)),
                Poll::Ready(None) => this.inner.set(None),
                Poll::Pending => return Poll::Pending,
            }
        }

        if *this.outer_done {
            Poll::Ready(None)
        } else {
            Poll::Pending
        }
    }
}

pub trait SwitchMapExt: Stream + Sized {
    fn switch_map<U, F>(self, f: F) -> SwitchMap<Self, F, U>
    where
        F: FnMut(Self::Item) -> U,
        U: Stream,
    {
        SwitchMap {
            outer: self,
            inner: None,
            f,
            outer_done: false,
        }
    }
}

impl<S: Stream> SwitchMapExt for S {}

/// Drops items equal to the one emitted just before them.
pub fn distinct_until_changed<S>(stream: S) -> impl Stream<Item = S::Item>
where
    S: Stream,
    S::Item: Clone + PartialEq,
{
    let mut last: Option<S::Item> = None;
    stream.filter_map(move |item| {
        let changed = last.as_ref() != Some(&item);
        if changed {
            last = Some(item.clone());
        }
        future::ready(changed.then_some(item))
    })
}

/// Pairs the latest values of two streams.
///
/// Nothing is emitted until both streams have produced a value; afterwards
/// every item from either side emits the updated pair.
pub fn combine_latest<A, B>(a: A, b: B) -> impl Stream<Item = (A::Item, B::Item)>
where
    A: Stream,
    B: Stream,
    A::Item: Clone,
    B::Item: Clone,
{
    let mut latest_a: Option<A::Item> = None;
    let mut latest_b: Option<B::Item> = None;

    stream::select(a.map(Either::Left), b.map(Either::Right)).filter_map(move |item| {
        match item {
            Either::Left(value) => latest_a = Some(value),
            Either::Right(value) => latest_b = Some(value),
        }
        future::ready(latest_a.clone().zip(latest_b.clone()))
    })
}

/// The current value of a watch channel followed by every later change.
///
/// Ends when the sender is dropped.
pub fn watch_stream<T>(rx: watch::Receiver<T>) -> BoxStream<'static, T>
where
    T: Clone + Send + Sync + 'static,
{
    stream::unfold((rx, true), |(mut rx, first)| async move {
        if !first {
            rx.changed().await.ok()?;
        }
        let value = rx.borrow_and_update().clone();
        Some((value, (rx, false)))
    })
    .boxed()
}
