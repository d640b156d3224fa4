// Copyright (C) 2026 Michael Wilson <mike@mdwn.dev>
//
// This program is free software: you can redistribute it and/or modify it under
// the terms of the GNU General Public License as published by the Free Software
// Foundation, version 3.
//
// This program is distributed in the hope that it will be useful, but WITHOUT
// ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS
// FOR A PARTICULAR PURPOSE. See the GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License along with
// this program. If not, see <https://www.gnu.org/licenses/>.
//

use thread_priority::{set_current_thread_priority, ThreadPriority, ThreadPriorityValue};
use tracing::info;

/// Default priority for the output worker when PADMIX_THREAD_PRIORITY is unset.
const DEFAULT_OUTPUT_THREAD_PRIORITY: u8 = 70;

/// Reads PADMIX_THREAD_PRIORITY (0-99) once, at worker startup.
fn output_thread_priority() -> ThreadPriorityValue {
    std::env::var("PADMIX_THREAD_PRIORITY")
        .ok()
        .and_then(|v| {
            let n = v.parse::<u8>().ok()?;
            (n < 100).then(|| ThreadPriorityValue::try_from(n).ok())?
        })
        .unwrap_or_else(|| ThreadPriorityValue::try_from(DEFAULT_OUTPUT_THREAD_PRIORITY).unwrap())
}

fn env_flag(name: &str) -> bool {
    std::env::var(name)
        .ok()
        .map(|v| {
            v == "1"
                || v.eq_ignore_ascii_case("true")
                || v.eq_ignore_ascii_case("yes")
                || v.eq_ignore_ascii_case("on")
        })
        .unwrap_or(false)
}

/// Returns whether we should attempt RT (SCHED_FIFO) scheduling for the
/// output worker. Default: enabled. Opt out with PADMIX_DISABLE_RT_AUDIO=1.
fn rt_audio_enabled() -> bool {
    !env_flag("PADMIX_DISABLE_RT_AUDIO")
}

/// Best-effort priority boost for the output worker. Failures are logged and
/// playback continues at normal priority.
pub fn configure_output_thread_priority() {
    let tp = ThreadPriority::Crossplatform(output_thread_priority());
    let _ = set_current_thread_priority(tp);

    #[cfg(unix)]
    if rt_audio_enabled() {
        use thread_priority::unix::{
            set_thread_priority_and_policy, thread_native_id, RealtimeThreadSchedulePolicy,
            ThreadSchedulePolicy,
        };
        match set_thread_priority_and_policy(
            thread_native_id(),
            tp,
            ThreadSchedulePolicy::Realtime(RealtimeThreadSchedulePolicy::Fifo),
        ) {
            Ok(()) => {
                info!("Enabled RT SCHED_FIFO for output worker");
            }
            Err(e) => {
                tracing::warn!(err = %e, "Failed to set RT SCHED_FIFO for output worker");
            }
        }
    }
}
