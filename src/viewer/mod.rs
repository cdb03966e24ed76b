//! Browser binding for the hover controller (wasm32 only).
//!
//! `HeatmapView` listens to `mousemove` on the window, reads the grid
//! element's bounding rect on every update and forwards hover changes to
//! JavaScript callbacks:
//!
//! ```javascript
//! import init, { HeatmapView } from 'heatgrid';
//! await init();
//! const view = new HeatmapView(svg, rows, { tileSize: 25 },
//!   (hover) => showTooltip(hover), () => hideTooltip());
//! view.register_bin(0, 0, () => highlight(0, 0), () => unhighlight(0, 0));
//! // on unmount
//! view.detach();
//! ```

use std::rc::Rc;

use js_sys::Function;
use serde::Serialize;
use wasm_bindgen::closure::Closure;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{Element, EventTarget, MouseEvent};

use crate::config::HeatmapConfig;
use crate::error::HeatgridError;
use crate::fill::FillScale;
use crate::hover::{
    GridHoverController, HoverCallbacks, HoverListener, PointerHandler, PointerSource, Subscription,
};
use crate::types::{BinIdentity, Dataset, GridBounds, HoverPayload, PointerPosition};

fn binding_error(e: impl std::fmt::Display) -> HeatgridError {
    HeatgridError::Binding(e.to_string())
}

/// Viewport-space `mousemove` events from a DOM event target.
struct DomPointerSource {
    target: EventTarget,
}

impl PointerSource for DomPointerSource {
    fn subscribe(&self, mut handler: PointerHandler) -> Subscription {
        let closure = Closure::wrap(Box::new(move |event: MouseEvent| {
            handler(PointerPosition::new(
                f64::from(event.client_x()),
                f64::from(event.client_y()),
            ));
        }) as Box<dyn FnMut(MouseEvent)>);

        if let Err(err) = self
            .target
            .add_event_listener_with_callback("mousemove", closure.as_ref().unchecked_ref())
        {
            tracing::warn!(?err, "failed to add mousemove listener");
            return Subscription::empty();
        }

        let target = self.target.clone();
        Subscription::new(move || {
            target
                .remove_event_listener_with_callback("mousemove", closure.as_ref().unchecked_ref())
                .ok();
        })
    }
}

fn element_bounds(element: &Element) -> GridBounds {
    let rect = element.get_bounding_client_rect();
    GridBounds::new(rect.top(), rect.left(), rect.bottom(), rect.right())
}

/// Forwards hover events to JavaScript callbacks.
struct JsListener {
    on_hover: Function,
    on_hover_end: Function,
}

impl HoverListener for JsListener {
    fn hover_changed(&mut self, payload: HoverPayload) {
        // json_compatible so records arrive as plain objects, not Maps
        let value = payload.serialize(&serde_wasm_bindgen::Serializer::json_compatible());
        match value {
            Ok(value) => {
                if let Err(err) = self.on_hover.call1(&JsValue::NULL, &value) {
                    tracing::warn!(?err, "hover callback threw");
                }
            }
            Err(err) => tracing::warn!(%err, "failed to serialize hover payload"),
        }
    }

    fn hover_ended(&mut self) {
        if let Err(err) = self.on_hover_end.call0(&JsValue::NULL) {
            tracing::warn!(?err, "hover end callback threw");
        }
    }
}

/// Heat map hover tracking exported to JavaScript.
#[wasm_bindgen]
pub struct HeatmapView {
    controller: GridHoverController,
}

#[wasm_bindgen]
impl HeatmapView {
    /// Attach hover tracking to `element`, the rectangle the grid is drawn in
    /// (typically the `<svg>` or `<canvas>`).
    ///
    /// `config` may be `undefined` for defaults.
    #[wasm_bindgen(constructor)]
    pub fn new(
        element: Element,
        dataset: JsValue,
        config: JsValue,
        on_hover: Function,
        on_hover_end: Function,
    ) -> Result<HeatmapView, JsValue> {
        console_error_panic_hook::set_once();

        let dataset: Dataset = serde_wasm_bindgen::from_value(dataset).map_err(binding_error)?;
        let config: HeatmapConfig = if config.is_undefined() || config.is_null() {
            HeatmapConfig::default()
        } else {
            serde_wasm_bindgen::from_value(config).map_err(binding_error)?
        };

        let listener = JsListener {
            on_hover,
            on_hover_end,
        };
        let mut controller = GridHoverController::new(config, Rc::new(dataset), listener)?;

        let window = web_sys::window().ok_or_else(|| binding_error("no window"))?;
        let source = DomPointerSource {
            target: window.into(),
        };
        controller.attach(&source, move || Some(element_bounds(&element)));

        Ok(Self { controller })
    }

    /// Replace the dataset (an array of rows).
    pub fn set_dataset(&mut self, dataset: JsValue) -> Result<(), JsValue> {
        let dataset: Dataset = serde_wasm_bindgen::from_value(dataset).map_err(binding_error)?;
        self.controller.set_dataset(Rc::new(dataset));
        Ok(())
    }

    pub fn set_tile_size(&mut self, tile_size: f64) -> Result<(), JsValue> {
        Ok(self.controller.set_tile_size(tile_size)?)
    }

    /// Register highlight start/stop callbacks for one bin.
    pub fn register_bin(&mut self, row: u32, column: u32, on_enter: Function, on_leave: Function) {
        let callbacks = HoverCallbacks::new(
            move || {
                on_enter.call0(&JsValue::NULL).ok();
            },
            move || {
                on_leave.call0(&JsValue::NULL).ok();
            },
        );
        self.controller
            .register(BinIdentity::new(row, column), callbacks);
    }

    pub fn unregister_bin(&mut self, row: u32, column: u32) {
        self.controller.unregister(BinIdentity::new(row, column));
    }

    /// Stop listening for pointer movement. Safe to call more than once.
    pub fn detach(&mut self) {
        self.controller.detach();
    }

    /// Grid width in pixels.
    pub fn width(&self) -> f64 {
        self.controller.scales().pixel_width
    }

    /// Grid height in pixels.
    pub fn height(&self) -> f64 {
        self.controller.scales().pixel_height
    }

    /// Fill color (`#RRGGBB`) for the bin at (`row`, `column`).
    pub fn fill_color(&self, row: u32, column: u32) -> Option<String> {
        let dataset = self.controller.dataset();
        let config = self.controller.config();
        let bin = dataset.bin(BinIdentity::new(row, column))?;
        let scale = FillScale::from_config(&dataset, &config).ok()?;
        Some(scale.bin_color(bin, &config.measure).to_hex())
    }

    /// `{x, y, width, height}` to paint for the bin at (`row`, `column`),
    /// with the configured gap applied, or `undefined` outside the grid.
    pub fn bin_rect(&self, row: u32, column: u32) -> Result<JsValue, JsValue> {
        let gap = self.controller.config().gap;
        match self.controller.scales().bin_rect(BinIdentity::new(row, column), gap) {
            Some(rect) => Ok(serde_wasm_bindgen::to_value(&rect).map_err(binding_error)?),
            None => Ok(JsValue::UNDEFINED),
        }
    }

    pub fn row_labels(&self) -> Vec<String> {
        let field = self.controller.config().row_label;
        self.controller.dataset().row_labels(&field)
    }

    pub fn column_labels(&self) -> Vec<String> {
        let field = self.controller.config().column_label;
        self.controller.dataset().column_labels(&field)
    }
}
