// Servobench
// Copyright (C) 2026 Synerthink

// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.

// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU Affero General Public License for more details.

// You should have received a copy of the GNU Affero General Public License
// along with this program.  If not, see <http://www.gnu.org/licenses/>.

//! Two cooperating tasks exchanging readings through a bounded queue.
//!
//! The producer runs every 10 ms at high priority, the consumer drains the
//! queue every 50 ms. The schedule runs on a fast-forwarding clock, so the
//! whole 200 ms window completes instantly and ends with the share report
//! and the scheduler profile.
//!
//! Run with `cargo run -p servobench-core --example producer_consumer`.

use servobench_core::clock::{Clock, ManualClock};
use servobench_core::sched::{Scheduler, Task};
use servobench_core::share::{OverwritePolicy, SharePool};
use std::sync::Arc;
use std::time::Duration;

fn main() {
    let pool = SharePool::new();
    let gain = pool.share("gain", 2i32);
    let readings = pool.queue::<i32>("readings", 16, OverwritePolicy::Reject);

    let clock = Arc::new(ManualClock::new());
    let mut sched = Scheduler::new(Arc::clone(&clock) as Arc<dyn Clock>);

    let producer_q = Arc::clone(&readings);
    let producer_gain = Arc::clone(&gain);
    sched.append(
        Task::new("producer", move |ctx| {
            let value = ctx.run as i32 * producer_gain.get();
            producer_q.try_put(value)?;
            Ok(0)
        })
        .with_priority(5)
        .with_period(Duration::from_millis(10))
        .with_profile(),
    );

    let consumer_q = Arc::clone(&readings);
    sched.append(
        Task::new("consumer", move |ctx| {
            for value in consumer_q.drain() {
                println!("[{:>8?}] consumed {value}", ctx.now);
            }
            Ok(0)
        })
        .with_priority(1)
        .with_period(Duration::from_millis(50))
        .with_profile(),
    );

    sched.run_for(Duration::from_millis(200));

    println!();
    println!("{}", pool.report());
    println!("{}", sched.summary());
}
