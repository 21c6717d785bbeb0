use std::{future::Future, pin::Pin, sync::Arc};

use crate::events::{EventHandler, EventProducer, Handler, TradeTransitionEvent};

/// The producer half handed to the flow API. Publishing is awaited only long enough to enqueue.
#[derive(Default, Clone)]
pub struct EventProducers {
    pub trade_transition_producer: Vec<EventProducer<TradeTransitionEvent>>,
}

/// The consumer half: owns the channels and drives registered hooks on spawned tasks.
pub struct EventHandlers {
    pub on_trade_transition: Option<EventHandler<TradeTransitionEvent>>,
}

impl EventHandlers {
    pub fn new(buffer_size: usize, hooks: EventHooks) -> Self {
        let on_trade_transition = hooks.on_trade_transition.map(|f| EventHandler::new(buffer_size, f));
        Self { on_trade_transition }
    }

    pub fn producers(&self) -> EventProducers {
        let mut result = EventProducers::default();
        if let Some(handler) = &self.on_trade_transition {
            result.trade_transition_producer.push(handler.subscribe());
        }
        result
    }

    pub async fn start_handlers(self) {
        if let Some(handler) = self.on_trade_transition {
            tokio::spawn(async move {
                handler.start_handler().await;
            });
        }
    }
}

/// Hook registration. The server installs its notification dispatcher here before the app starts.
#[derive(Default, Clone)]
pub struct EventHooks {
    pub on_trade_transition: Option<Handler<TradeTransitionEvent>>,
}

impl EventHooks {
    pub fn on_trade_transition<F>(&mut self, f: F) -> &mut Self
    where F: (Fn(TradeTransitionEvent) -> Pin<Box<dyn Future<Output = ()> + Send>>) + Send + Sync + 'static {
        self.on_trade_transition = Some(Arc::new(f));
        self
    }
}
