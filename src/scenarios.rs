//! The two demo hosts: a cell that absorbs nano-probe and bacterial traits, and
//! an app that mixes a beeper and a laser shark into a single-inheritance chain.

use std::rc::Rc;

use log::info;
use polymix::{arg, ClassBuilder, ObjectClass, ObjectError, ObjectRef, Value};

fn receiver(this: &Value) -> Result<&ObjectRef, String> {
    this.as_object().ok_or_else(|| "method called without an object receiver".to_string())
}

/// `initVars.hasOwnProperty(key) ? initVars[key] : None`
fn init_var(init_vars: &Value, key: &str) -> Option<Value> {
    init_vars.as_object().and_then(|vars| vars.get_own(key))
}

pub struct Cells {
    pub nano_probe: Rc<ObjectClass>,
    pub animal: Rc<ObjectClass>,
}

impl Cells {
    pub fn define() -> Self {
        let mut builder = ClassBuilder::new("Eukaryote");
        // Initialized before the constructor body runs, so it only ever sees `undefined`.
        let _private_radius = builder.declare_private_with("privateRadius", |this| this.get("radius"));
        let eukaryote = builder
            .field("foo", "Some public property")
            .method("cellImportinTransport", 1, |this, args| {
                let rna = arg(args, 0);
                if matches!(rna, Value::Undefined) {
                    return Ok(Value::Undefined);
                }
                let nucleus = receiver(this)?.get("nucleus");
                if let Some(nucleus) = nucleus.as_object() {
                    nucleus.set("importedRna", rna.clone()).map_err(|e| e.to_string())?;
                }
                Ok(format!("RNA {} was imported", rna).into())
            })
            .constructor(|ctx| {
                let radius = match ctx.arg(0) {
                    Value::Number(radius) => radius * 2.0,
                    _ => 1.0,
                };
                ctx.set("radius", radius)?;
                ctx.set("hasNucleus", true)?;
                ctx.set("nucleus", ObjectRef::new_plain())?;
                ctx.set("hasNanoProbe", false)?;
                ctx.make_mixable()
            })
            .build();

        let bacteria = ClassBuilder::new("Bacteria")
            .method("createHydrocarbon", 0, |_this, _args| {
                info!("This trait allows consumption of Co2");
                Ok(Value::Undefined)
            })
            .method("gurgle", 0, |_this, _args| Ok("gurgle".into()))
            .constructor(|ctx| {
                let radius = ctx.arg(0).as_number().unwrap_or(1.0);
                ctx.set("radius", radius)?;
                ctx.set("hasNucleus", false)?;
                ctx.set("toughCellWall", ObjectRef::new_plain())?;
                ctx.make_mixable()
            })
            .build();

        let nano_probe = ClassBuilder::new("NanoProbe")
            .method("beep", 0, |_this, _args| Ok("boop".into()))
            .method("logCellActivity", 1, |_this, args| {
                info!("{}", arg(args, 0));
                Ok(Value::Undefined)
            })
            .constructor(|ctx| {
                ctx.set("hasNanoProbe", true)?;
                ctx.set("borgProperty1", "Some value")?;
                ctx.set(
                    "borgCapability1",
                    polymix::make_native_function_value("borgCapability1", 1, |_this, args| {
                        Ok(match arg(args, 0) {
                            Value::Number(n) => Value::Number(n + 1.0),
                            other => other,
                        })
                    }),
                )?;
                ctx.make_mixable()
            })
            .build();

        let animal = {
            let nano_probe = nano_probe.clone();
            ClassBuilder::new("Animal")
                .extends(&eukaryote)
                .method("identify", 0, |this, _args| {
                    let this = receiver(this)?;
                    let transport = this
                        .invoke("cellImportinTransport", &["CAGTA".into()])
                        .map_err(|e| e.to_string())?;
                    let mut report = format!(
                        "This Animal's name is {}, its cells have a radius of {}, {}, there is also {}",
                        this.get("name"),
                        this.get("radius"),
                        transport,
                        this.get("foo")
                    );
                    let probe = this.get("NP");
                    if let Some(probe) = probe.as_object() {
                        if probe.get("hasNanoProbe") == Value::Bool(true) {
                            let beep = probe.invoke("beep", &[]).map_err(|e| e.to_string())?;
                            let gurgle = match this.get("Bact").as_object() {
                                Some(bact) => bact.invoke("gurgle", &[]).map_err(|e| e.to_string())?,
                                None => Value::Undefined,
                            };
                            report.push_str(&format!(
                                "\nAlert!!! WE ARE BORG! {} RESISTANCE IS FUTILE. Our bacterial traits include: {}",
                                beep, gurgle
                            ));
                        }
                    }
                    Ok(report.into())
                })
                .constructor(move |ctx| {
                    let radius = ctx.arg(1);
                    ctx.call_super(&[radius])?;
                    ctx.mixin_namespaced("NP", nano_probe.construct(&[])?)?;
                    ctx.mixin_namespaced("Bact", bacteria.construct(&[])?)?;
                    // Flat: NanoProbe's hasNanoProbe replaces Eukaryote's.
                    ctx.mixin(nano_probe.construct(&[])?)?;
                    ctx.set("name", ctx.arg(0))
                })
                .build()
        };

        Cells { nano_probe, animal }
    }

    pub fn host(&self) -> Result<ObjectRef, ObjectError> {
        self.animal.construct(&["Seven".into(), Value::Number(5.0)])
    }
}

pub struct KillerApp {
    laser_shark: Rc<ObjectClass>,
    killer_app: Rc<ObjectClass>,
}

impl KillerApp {
    pub fn define() -> Self {
        let mut builder = ClassBuilder::new("Ancestor");
        let _bar = builder.declare_private("privatePropertyBar", "Hehe! Nobody outside the class can see or touch me!!!");
        let ancestor = builder
            .method("speak", 1, |this, args| {
                let said = arg(args, 0);
                if !matches!(said, Value::Undefined) {
                    info!("{}", said);
                }
                Ok(this.clone())
            })
            .constructor(|ctx| {
                let init_vars = ctx.arg(0);
                let foo = init_var(&init_vars, "foo").unwrap_or(Value::Bool(false));
                if let Some(vars) = init_vars.as_object() {
                    vars.set("foo", foo.clone())?;
                }
                ctx.set("foo", foo)?;
                ctx.set("otherProperty", "I'm some configuration details...")?;
                ctx.set("lastPropertyToSetup", "Ok, all done with constructor stuff")?;
                ctx.make_mixable()
            })
            .build();

        let mut builder = ClassBuilder::new("Beeper");
        let inaccessible = builder.declare_private("inaccessiblevariable", 3.0);
        let hidden_prefix = builder.declare_private("hiddenPrefixVar", "secretPrefix");
        let beeper = builder
            .method("beep", 1, |this, args| {
                if let Value::Number(frequency) = arg(args, 0) {
                    info!("Beeping at frequency {}!", frequency);
                }
                Ok(this.clone())
            })
            .constructor(move |ctx| {
                let conf = init_var(&ctx.arg(0), "beeperConfPropertyFoo").unwrap_or(Value::Bool(false));
                ctx.set("beeperConfPropertyFoo", conf.clone())?;
                ctx.set("bar", "A bar obviously...")?;
                ctx.set("bat", "A beeper bat")?;
                // Private state only reaches the outside through values derived here.
                let factor = ctx.private_get(&inaccessible)?.as_number().unwrap_or(0.0);
                ctx.set("resultOfMathWithInaccessibleVariable", 5.0 * factor)?;
                let prefix = ctx.private_get(&hidden_prefix)?;
                ctx.set(
                    "resultOfStringManipulationWithInaccessiblStringVar",
                    format!("{}_{}", prefix, conf),
                )?;
                ctx.make_mixable()
            })
            .build();

        let laser_shark = ClassBuilder::new("LaserShark")
            .method("bite", 1, |this, args| {
                match arg(args, 0) {
                    Value::Undefined => info!("You told this LaserShark to bite, without giving it a target to bite..."),
                    something => info!("Chomping down on something with contents: {}", something),
                }
                Ok(this.clone())
            })
            .constructor(|ctx| {
                match init_var(&ctx.arg(0), "laserWavelength") {
                    Some(Value::Number(wavelength)) => ctx.set("laserWavelength", wavelength)?,
                    _ => {
                        ctx.set("laserWavelength", false)?;
                        info!("This LaserShark can't Lase!");
                    }
                }
                ctx.set("bar", "A shark bar")?;
                ctx.set("bat", "A shark bat")?;
                ctx.set(
                    "lastPropertyToSetup",
                    "If you Mixed in LaserShark without a namespace on the host class, lastPropertyToSetup got overwritten.",
                )?;
                ctx.make_mixable()
            })
            .build();

        let killer_app = {
            let laser_shark = laser_shark.clone();
            ClassBuilder::new("KillerApp")
                .extends(&ancestor)
                .method("showCapabilities", 0, |this, _args| {
                    Ok(polymix::debug::dump_value(this).into())
                })
                .constructor(move |ctx| {
                    let args = ctx.args().to_vec();
                    ctx.call_super(&args)?;
                    ctx.set("fee", "fee")?;
                    ctx.set("fye", "fye")?;
                    ctx.set("foeh", "foeh")?;

                    let beeper_vars = ObjectRef::from_entries([("beeperConfPropertyFoo", Value::from("boopmode"))]);
                    let shark_vars = ObjectRef::from_entries([("laserWavelength", Value::Number(450.0))]);
                    ctx.mixin_namespaced("Beeper", beeper.construct(&[beeper_vars.into()])?)?;
                    ctx.mixin_namespaced("LaserShark", laser_shark.construct(&[shark_vars.into()])?)?;
                    Ok(())
                })
                .build()
        };

        KillerApp { laser_shark, killer_app }
    }

    pub fn host(&self) -> Result<ObjectRef, ObjectError> {
        let init_vars = ObjectRef::from_entries([("foo", Value::from("barBatBaz"))]);
        self.killer_app.construct(&[init_vars.into()])
    }

    /// A LaserShark instance to compose flat onto the host, the pitfall case.
    pub fn flat_donor(&self) -> Result<ObjectRef, ObjectError> {
        let vars = ObjectRef::from_entries([("laserWavelength", Value::Number(450.0))]);
        self.laser_shark.construct(&[vars.into()])
    }
}
