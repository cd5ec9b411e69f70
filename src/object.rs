//! Prototype object runtime.
//!
//! A class is a Rust type with an immutable [`Class::PROTOTYPE`]: every use
//! of the constant yields a fresh instance holding the class defaults. That
//! instance is not usable until [`Class::init`] completes construction.
//! Splitting allocation from initialization keeps [`Object::release`] safe
//! to call on an instance whose `init` failed halfway.
//!
//! [`ObjectHeap`] stores instances of any class behind generational
//! [`ObjectId`] handles. It tracks each instance's lifecycle so that use
//! before `init`, a second `init`, and double destruction are reported as
//! errors rather than left undefined.

use crate::error::{ContainerError, Result};
use core::any::Any;
use core::marker::PhantomData;
use slotmap::{DefaultKey, SlotMap};
use tracing::{debug, warn};

/// Uniform instance shape shared by every class.
pub trait Object: Any {
    fn class_name(&self) -> &'static str;

    /// Destructor message: release everything `init` acquired. Must tolerate
    /// a partially initialized instance and leave it equivalent to a fresh
    /// prototype copy.
    fn release(&mut self);

    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

/// A constructible object type.
pub trait Class: Object + Sized {
    const NAME: &'static str;

    /// Defaults copied into every new instance. Holds no allocations.
    const PROTOTYPE: Self;

    /// Arguments consumed by [`Class::init`].
    type Args<'a>;

    /// Second construction phase. On error the instance may hold partial
    /// state; callers run [`Object::release`] before discarding it.
    fn init(&mut self, args: Self::Args<'_>) -> Result<()>;
}

/// First construction phase: a fresh copy of the class prototype.
pub fn allocate<C: Class>() -> C {
    C::PROTOTYPE
}

/// Allocate and initialize in one step.
pub fn construct<C: Class>(args: C::Args<'_>) -> Result<C> {
    let mut obj = allocate::<C>();
    match obj.init(args) {
        Ok(()) => Ok(obj),
        Err(e) => {
            obj.release();
            Err(e)
        }
    }
}

/// Typed handle to an instance stored in an [`ObjectHeap`].
pub struct ObjectId<C> {
    key: DefaultKey,
    _class: PhantomData<fn() -> C>,
}

impl<C> ObjectId<C> {
    fn new(key: DefaultKey) -> Self {
        Self {
            key,
            _class: PhantomData,
        }
    }
}

impl<C> Clone for ObjectId<C> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<C> Copy for ObjectId<C> {}

impl<C> PartialEq for ObjectId<C> {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key
    }
}

impl<C> Eq for ObjectId<C> {}

impl<C> core::fmt::Debug for ObjectId<C> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_tuple("ObjectId").field(&self.key).finish()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Lifecycle {
    Allocated,
    Ready,
}

struct Instance {
    object: Box<dyn Object>,
    state: Lifecycle,
}

/// Owner of heterogeneous object instances.
#[derive(Default)]
pub struct ObjectHeap {
    slots: SlotMap<DefaultKey, Instance>,
}

impl ObjectHeap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live (allocated or initialized) instances.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn allocate<C: Class>(&mut self) -> ObjectId<C> {
        let key = self.slots.insert(Instance {
            object: Box::new(allocate::<C>()),
            state: Lifecycle::Allocated,
        });
        debug!(class = C::NAME, "object allocated");
        ObjectId::new(key)
    }

    /// Run `init` on an allocated instance. On failure the instance is
    /// released and stays allocated; it may be initialized again or
    /// destroyed.
    pub fn init<C: Class>(&mut self, id: ObjectId<C>, args: C::Args<'_>) -> Result<()> {
        let inst = self
            .slots
            .get_mut(id.key)
            .ok_or(ContainerError::StaleObject)?;
        if inst.state == Lifecycle::Ready {
            warn!(class = C::NAME, "init sent to initialized object");
            return Err(ContainerError::AlreadyInitialized { class: C::NAME });
        }
        let obj = downcast_mut::<C>(inst.object.as_mut())?;
        match obj.init(args) {
            Ok(()) => {
                inst.state = Lifecycle::Ready;
                Ok(())
            }
            Err(e) => {
                debug!(class = C::NAME, error = %e, "object init failed");
                obj.release();
                Err(e)
            }
        }
    }

    /// Allocate then initialize. A failed `init` frees the slot.
    pub fn construct<C: Class>(&mut self, args: C::Args<'_>) -> Result<ObjectId<C>> {
        let id = self.allocate::<C>();
        if let Err(e) = self.init(id, args) {
            self.slots.remove(id.key);
            return Err(e);
        }
        Ok(id)
    }

    pub fn get<C: Class>(&self, id: ObjectId<C>) -> Result<&C> {
        let inst = self.slots.get(id.key).ok_or(ContainerError::StaleObject)?;
        ready::<C>(inst)?;
        downcast_ref::<C>(inst.object.as_ref())
    }

    pub fn get_mut<C: Class>(&mut self, id: ObjectId<C>) -> Result<&mut C> {
        let inst = self
            .slots
            .get_mut(id.key)
            .ok_or(ContainerError::StaleObject)?;
        ready::<C>(inst)?;
        downcast_mut::<C>(inst.object.as_mut())
    }

    /// Invoke a method on an initialized instance.
    pub fn dispatch<C, R, F>(&mut self, id: ObjectId<C>, method: F) -> Result<R>
    where
        C: Class,
        F: FnOnce(&mut C) -> R,
    {
        self.get_mut(id).map(method)
    }

    /// Class name of whatever instance `id` refers to.
    pub fn class_of<C>(&self, id: ObjectId<C>) -> Result<&'static str> {
        self.slots
            .get(id.key)
            .map(|inst| inst.object.class_name())
            .ok_or(ContainerError::StaleObject)
    }

    /// Send the destructor message and free the slot. A second `destroy`
    /// on the same handle reports [`ContainerError::StaleObject`].
    pub fn destroy<C>(&mut self, id: ObjectId<C>) -> Result<()> {
        let Some(mut inst) = self.slots.remove(id.key) else {
            warn!("destroy sent to stale object handle");
            return Err(ContainerError::StaleObject);
        };
        debug!(class = inst.object.class_name(), "object destroyed");
        inst.object.release();
        Ok(())
    }
}

impl Drop for ObjectHeap {
    fn drop(&mut self) {
        for (_, inst) in self.slots.iter_mut() {
            inst.object.release();
        }
    }
}

fn ready<C: Class>(inst: &Instance) -> Result<()> {
    match inst.state {
        Lifecycle::Ready => Ok(()),
        Lifecycle::Allocated => Err(ContainerError::NotInitialized { class: C::NAME }),
    }
}

fn downcast_ref<C: Class>(obj: &dyn Object) -> Result<&C> {
    let found = obj.class_name();
    obj.as_any()
        .downcast_ref::<C>()
        .ok_or(ContainerError::WrongClass {
            expected: C::NAME,
            found,
        })
}

fn downcast_mut<C: Class>(obj: &mut dyn Object) -> Result<&mut C> {
    let found = obj.class_name();
    obj.as_any_mut()
        .downcast_mut::<C>()
        .ok_or(ContainerError::WrongClass {
            expected: C::NAME,
            found,
        })
}

/// Implements [`Object`] for a [`Class`] whose destructor is its
/// `release` inherent method.
macro_rules! impl_object {
    ($ty:ident $(<$($p:ident),+>)? $(where $($b:tt)+)?) => {
        impl$(<$($p),+>)? $crate::object::Object for $ty$(<$($p),+>)?
        $(where $($b)+)?
        {
            fn class_name(&self) -> &'static str {
                <Self as $crate::object::Class>::NAME
            }
            fn release(&mut self) {
                $ty::release(self)
            }
            fn as_any(&self) -> &dyn core::any::Any {
                self
            }
            fn as_any_mut(&mut self) -> &mut dyn core::any::Any {
                self
            }
        }
    };
}

pub(crate) use impl_object;
