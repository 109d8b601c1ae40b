use tokio::sync::mpsc::{
    UnboundedReceiver,
    UnboundedSender,
    unbounded_channel,
};

use crate::protocol::{
    Event,
    InputEvent,
};

#[derive(thiserror::Error, Debug)]
pub enum ConduitError {
    #[error("the other end of the conduit has been dropped")]
    Disconnected,
}

/// The view would own this struct.
/// [ViewEnd] serves two purposes
/// - To deliver user inputs to the control layer from the view layer
/// - To deliver state changes from the control layer to the view layer
pub struct ViewEnd {
    /// Used by the view to send input to the control
    pub sender: UnboundedSender<InputEvent>,
    /// To receive messages from control about state changes
    pub receiver: UnboundedReceiver<Event>,
}

impl ViewEnd {
    /// Sends a user intent to the control layer through the conduit
    pub fn send(&self, input: InputEvent) -> Result<(), ConduitError> {
        self.sender.send(input).map_err(|_e| ConduitError::Disconnected)
    }
}

/// This compliments the [ViewEnd]. It can be thought of as the "other end" of a pipe.
/// The control would own this.
pub struct ControlEnd {
    /// Used by the control to send state changes to the view
    pub sender: UnboundedSender<Event>,
    /// To receive user input from the view
    pub receiver: UnboundedReceiver<InputEvent>,
}

impl ControlEnd {
    /// Sends an event to the view layer through the conduit
    pub fn send(&self, event: Event) -> Result<(), ConduitError> {
        self.sender.send(event).map_err(|_e| ConduitError::Disconnected)
    }
}

/// Creates a bidirectional communication channel between view and control layers.
///
/// The view sends [InputEvent]s and receives [Event]s; the control does the opposite. Both
/// directions are unbounded so neither side ever blocks the other.
pub fn get_conduit_pair() -> (ViewEnd, ControlEnd) {
    let (event_tx, event_rx) = unbounded_channel::<Event>();
    let (input_tx, input_rx) = unbounded_channel::<InputEvent>();

    (
        ViewEnd {
            sender: input_tx,
            receiver: event_rx,
        },
        ControlEnd {
            sender: event_tx,
            receiver: input_rx,
        },
    )
}
