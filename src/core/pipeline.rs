//! # Run the pipeline for a single message.
//!
//! Executes decode → execute → encode → publish → ack for one [`Message`] and
//! publishes the outcome to the [`Bus`].
//!
//! ## Event flow
//!
//! ```text
//! Success:
//!   decode → execute → encode → publish Ok → ack → MessageAcked
//!
//! Decode / execute / encode failure:
//!   stage Err → DecodeFailed | ExecuteFailed | EncodeFailed → message dropped (no ack)
//!
//! Publish failure:
//!   publish Err → PublishFailed → ack → MessageAcked
//! ```
//!
//! ## Rules
//! - Stages run **strictly in order**; none of them is raced against cancellation
//! - A failure affects **this message only**; the caller goes back to idle
//! - A panic inside `Job::execute` is caught and reported as `ExecuteFailed`
//! - A publish failure **still acknowledges** the source message (no retry)

use std::any::type_name;
use std::panic::AssertUnwindSafe;

use futures::FutureExt;

use crate::{
    broker::{Broker, Message},
    codec::Codec,
    error::{JobError, StageError, panic_message},
    events::{Bus, Event, EventKind},
    jobs::Job,
};

/// Runs the full pipeline for `msg` on behalf of `worker`.
///
/// Publishes exactly one stage-failure event on failure and `MessageAcked`
/// whenever the message is acknowledged.
pub(crate) async fn process<B, J, C>(
    worker: u8,
    msg: Message,
    broker: &B,
    job: &J,
    codec: &C,
    bus: &Bus,
) -> Result<(), StageError>
where
    B: Broker + ?Sized,
    J: Job + ?Sized,
    C: Codec,
{
    let res = run_stages(msg.data(), broker, job, codec).await;

    match res {
        Ok(()) => {
            ack(worker, msg, bus);
            Ok(())
        }
        Err(e) => {
            bus.publish(Event::stage_failed(worker, &e));
            if e.acknowledges() {
                ack(worker, msg, bus);
            }
            Err(e)
        }
    }
}

async fn run_stages<B, J, C>(
    payload: &[u8],
    broker: &B,
    job: &J,
    codec: &C,
) -> Result<(), StageError>
where
    B: Broker + ?Sized,
    J: Job + ?Sized,
    C: Codec,
{
    let mut input = job.new_in_message();
    codec
        .decode(payload, &mut input)
        .map_err(|source| StageError::Decode {
            type_name: type_name::<J::In>(),
            source,
        })?;

    let output = AssertUnwindSafe(job.execute(input))
        .catch_unwind()
        .await
        .unwrap_or_else(|panic| {
            Err(JobError::fail(format!(
                "panicked: {}",
                panic_message(&*panic)
            )))
        })
        .map_err(StageError::Execute)?;

    let bytes = codec
        .encode(&output)
        .map_err(|source| StageError::Encode {
            type_name: type_name::<J::Out>(),
            source,
        })?;

    broker.publish(bytes).await.map_err(StageError::Publish)
}

/// Acknowledges the message and reports it.
fn ack(worker: u8, msg: Message, bus: &Bus) {
    msg.ack();
    bus.publish(Event::new(EventKind::MessageAcked).with_worker(worker));
}
