//! Derive macro for mbe-ecs components.
//!
//! `#[derive(Component)]` implements `mbe_ecs::Component`. The optional
//! `#[component(...)]` attribute configures it:
//!
//! - `name = "..."`: stable type name reported by `Component::type_name`,
//!   used in errors and by serialisers. Defaults to `std::any::type_name`.
//! - `bases(dyn Trait, ...)`: types the component can also be looked up
//!   as. Each must be reachable from the component by a pointer coercion,
//!   so interfaces the type implements (`dyn Trait`) are the usual choice.
//!   An entry may continue up an interface chain: `dyn Animated => dyn
//!   Drawable` registers both, for `trait Animated: Drawable`.
//! - `update = path`: function `fn(&mut Self, &Frame<'_>)` run by
//!   `Component::update`.
//!
//! ```ignore
//! #[derive(Component)]
//! #[component(name = "sprite", bases(dyn Animated => dyn Drawable), update = Self::animate)]
//! struct Sprite { frame: u32 }
//! ```

use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::{
    DeriveInput, LitStr, Path, Token, Type, parenthesized, parse::ParseStream,
    punctuated::Punctuated,
};

#[derive(Default)]
struct ComponentArgs {
    name: Option<LitStr>,
    /// Each entry is a chain `Base => Grandbase => ...` starting at `Self`.
    bases: Vec<Vec<Type>>,
    update: Option<Path>,
}

fn parse_chain(input: ParseStream<'_>) -> syn::Result<Vec<Type>> {
    let chain = Punctuated::<Type, Token![=>]>::parse_separated_nonempty(input)?;
    Ok(chain.into_iter().collect())
}

impl ComponentArgs {
    fn from_input(input: &DeriveInput) -> syn::Result<Self> {
        let mut args = Self::default();

        for attr in input.attrs.iter().filter(|attr| attr.path().is_ident("component")) {
            attr.parse_nested_meta(|meta| {
                if meta.path.is_ident("name") {
                    if args.name.is_some() {
                        return Err(meta.error("duplicate `name`"));
                    }
                    args.name = Some(meta.value()?.parse()?);
                    Ok(())
                } else if meta.path.is_ident("bases") {
                    let content;
                    parenthesized!(content in meta.input);
                    let chains =
                        Punctuated::<Vec<Type>, Token![,]>::parse_terminated_with(&content, parse_chain)?;
                    args.bases.extend(chains);
                    Ok(())
                } else if meta.path.is_ident("update") {
                    if args.update.is_some() {
                        return Err(meta.error("duplicate `update`"));
                    }
                    args.update = Some(meta.value()?.parse()?);
                    Ok(())
                } else {
                    Err(meta.error("expected `name`, `bases` or `update`"))
                }
            })?;
        }

        Ok(args)
    }
}

/// Derive `mbe_ecs::Component`.
///
/// See the crate documentation for the `#[component(...)]` options.
#[proc_macro_derive(Component, attributes(component))]
pub fn derive_component(input: TokenStream) -> TokenStream {
    let input = syn::parse_macro_input!(input as DeriveInput);
    expand(&input)
        .unwrap_or_else(syn::Error::into_compile_error)
        .into()
}

fn expand(input: &DeriveInput) -> syn::Result<TokenStream2> {
    let args = ComponentArgs::from_input(input)?;
    let ident = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();
    let self_ty = quote!(#ident #ty_generics);

    let type_name = args.name.as_ref().map(|name| {
        if name.value().trim().is_empty() {
            return syn::Error::new(name.span(), "component name must not be empty")
                .into_compile_error();
        }
        quote! {
            fn type_name() -> &'static str {
                #name
            }
        }
    });

    let declare_bases = (!args.bases.is_empty()).then(|| {
        let heads = args.bases.iter().map(|chain| &chain[0]);
        let links = args.bases.iter().flat_map(|chain| chain.windows(2)).map(|pair| {
            let (derived, base) = (&pair[0], &pair[1]);
            quote!(::mbe_ecs::declare_bases!(bases, #derived => #base);)
        });
        quote! {
            fn declare_bases(bases: &mut ::mbe_ecs::ComponentBases) {
                ::mbe_ecs::declare_bases!(bases, #self_ty => #(#heads),*);
                #(#links)*
            }
        }
    });

    let update = args.update.as_ref().map(|path| {
        quote! {
            fn update(&mut self, frame: &::mbe_ecs::Frame<'_>) {
                #path(self, frame);
            }
        }
    });

    let generic_static = input.generics.type_params().map(|param| {
        let param = &param.ident;
        quote!(#param: 'static)
    });
    let where_clause = match where_clause {
        Some(clause) => {
            let predicates = clause.predicates.iter();
            quote!(where #(#predicates,)* #(#generic_static,)*)
        }
        None => quote!(where #(#generic_static,)*),
    };

    Ok(quote! {
        impl #impl_generics ::mbe_ecs::Component for #self_ty #where_clause {
            #type_name
            #declare_bases
            #update
        }
    })
}
