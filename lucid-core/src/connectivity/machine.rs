//! Connectivity state machine
//!
//! Transitions are pure: the machine returns the next state plus the
//! driver work to perform, and the manager executes that work.

use core::net::Ipv4Addr;

use heapless::{String, Vec};
use lucid_hal::credentials::MAX_SSID_LEN;

use super::events::{Effect, Event};
use super::state::{ConnectivityState, WifiMode, NO_SIGNAL_RSSI};
use crate::config::ReconnectPolicy;

/// Largest number of effects a single transition produces
pub const MAX_EFFECTS: usize = 3;

/// Fixed inputs to the transition function
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MachineParams {
    /// Address reported while in AP mode
    pub gateway: Ipv4Addr,
    pub reconnect: ReconnectPolicy,
}

/// Result of an accepted event
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    pub state: ConnectivityState,
    pub effects: Vec<Effect, MAX_EFFECTS>,
}

impl Transition {
    fn new(state: ConnectivityState) -> Self {
        Self {
            state,
            effects: Vec::new(),
        }
    }

    fn effect(mut self, effect: Effect) -> Self {
        // Capacity covers every transition in the table below
        let _ = self.effects.push(effect);
        self
    }
}

impl ConnectivityState {
    /// Compute the transition for an event
    ///
    /// Returns `None` when the event has no meaning in the current mode.
    pub fn transition(&self, event: &Event, params: &MachineParams) -> Option<Transition> {
        use Event::*;
        use WifiMode::*;

        let mut next = self.clone();

        let transition = match (self.mode, event) {
            // Boot transitions
            (
                Init,
                Boot {
                    station: Some(ssid),
                    provisioned,
                    ..
                },
            ) => {
                next.mode = StaConnecting;
                next.ssid = ssid.clone();
                next.provisioned = *provisioned;
                Transition::new(next)
            }
            (
                Init,
                Boot {
                    station: None,
                    provisioned,
                    ap_ssid,
                },
            ) => {
                next.provisioned = *provisioned;
                next.enter_ap(ap_ssid, params.gateway);
                Transition::new(next).effect(Effect::StartAp {
                    ssid: ap_ssid.clone(),
                })
            }

            // Station transitions
            (StaConnecting, Associated { ssid }) => {
                next.ssid = ssid.clone();
                next.rssi = 0;
                Transition::new(next)
            }
            (StaConnecting, GotIp { ip, rssi }) => {
                next.mode = StaConnected;
                next.ip = *ip;
                next.rssi = *rssi;
                next.reconnect_attempts = 0;
                Transition::new(next)
            }
            (StaConnecting | StaConnected, Disconnected { .. }) => {
                let delay_ms = params.reconnect.delay_ms(self.reconnect_attempts);
                next.mode = StaDisconnected;
                next.ip = Ipv4Addr::UNSPECIFIED;
                next.rssi = NO_SIGNAL_RSSI;
                next.reconnect_attempts = self.reconnect_attempts.saturating_add(1);
                Transition::new(next).effect(Effect::Reconnect { delay_ms })
            }
            (StaDisconnected, ReconnectIssued) => {
                next.mode = StaConnecting;
                Transition::new(next)
            }

            // Access point transitions
            (ApMode, StationJoined) => {
                next.client_count = self.client_count.saturating_add(1);
                Transition::new(next)
            }
            (ApMode, StationLeft) => {
                next.client_count = self.client_count.saturating_sub(1);
                Transition::new(next)
            }

            // Requests are valid from any mode
            (_, Connect(credentials)) => {
                next.mode = StaConnecting;
                next.ssid = credentials.ssid.clone();
                next.ip = Ipv4Addr::UNSPECIFIED;
                next.rssi = NO_SIGNAL_RSSI;
                next.client_count = 0;
                next.provisioned = true;
                next.reconnect_attempts = 0;
                Transition::new(next)
                    .effect(Effect::StopRadio)
                    .effect(Effect::StartStation(credentials.clone()))
            }
            (_, ResetToAp { ap_ssid }) => {
                next.enter_ap(ap_ssid, params.gateway);
                Transition::new(next)
                    .effect(Effect::StopRadio)
                    .effect(Effect::Settle)
                    .effect(Effect::StartAp {
                        ssid: ap_ssid.clone(),
                    })
            }

            _ => return None,
        };

        Some(transition)
    }

    fn enter_ap(&mut self, ap_ssid: &String<MAX_SSID_LEN>, gateway: Ipv4Addr) {
        self.mode = WifiMode::ApMode;
        self.ssid = ap_ssid.clone();
        self.ip = gateway;
        self.rssi = NO_SIGNAL_RSSI;
        self.client_count = 0;
        self.reconnect_attempts = 0;
    }
}
